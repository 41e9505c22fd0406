use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use common::{ErrorKind, Result};

/// Bounded retry for signed Binance calls.
///
/// Only timestamp-skew failures are retried, after a fixed delay. Permission
/// and parameter failures abort on the first attempt; everything else is
/// returned unchanged.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub skew_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            skew_delay: Duration::from_secs(1),
        }
    }
}

/// Run `call` under `policy`. `label` only appears in log events.
///
/// A persistent skew error invokes `call` exactly `max_attempts` times and
/// returns the last error.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        match err.kind() {
            ErrorKind::TimestampSkew if attempt < max_attempts => {
                warn!(call = label, attempt, max_attempts, "Timestamp outside recvWindow, retrying");
                tokio::time::sleep(policy.skew_delay).await;
            }
            ErrorKind::PermissionDenied | ErrorKind::InvalidParameter => {
                error!(call = label, error = %err, "Not retrying");
                return Err(err);
            }
            _ => return Err(err),
        }
    }
}
