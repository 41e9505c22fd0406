use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

pub const BINANCE_TESTNET_URL: &str = "https://testnet.binance.vision";
pub const OKX_BASE_URL: &str = "https://www.okx.com";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// API key pair. `Debug` never prints the secret or passphrase.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
    /// Only OKX uses this; empty for Binance.
    pub passphrase: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: String::new(),
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = passphrase.into();
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask(&self.api_key))
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Keeps the first four characters of a key so operators can tell keys apart.
fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}****")
}

/// Settings for the Binance probes, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub credentials: Credentials,
    pub base_url: String,
    /// Tolerance in milliseconds for signed requests.
    pub recv_window: u64,
    pub symbol: String,
    pub order_quantity: String,
    pub chart_path: String,
    pub http_timeout: Duration,
}

impl BinanceConfig {
    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Ok(BinanceConfig {
            credentials: Credentials::new(
                required_env("BINANCE_API_KEY")?,
                required_env("BINANCE_API_SECRET")?,
            ),
            base_url: optional_env("BINANCE_BASE_URL")
                .unwrap_or_else(|| BINANCE_TESTNET_URL.to_string()),
            recv_window: parsed_env("BINANCE_RECV_WINDOW")?.unwrap_or(10_000),
            symbol: optional_env("BINANCE_SYMBOL").unwrap_or_else(|| "BTCUSDT".to_string()),
            order_quantity: optional_env("BINANCE_ORDER_QTY")
                .unwrap_or_else(|| "0.001".to_string()),
            chart_path: optional_env("PROBE_CHART_PATH")
                .unwrap_or_else(|| "btc_price_chart.png".to_string()),
            http_timeout: http_timeout()?,
        })
    }
}

/// Settings for the OKX probe, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct OkxConfig {
    pub credentials: Credentials,
    pub base_url: String,
    /// Route requests to the demo-trading environment.
    pub simulated: bool,
    pub http_timeout: Duration,
}

impl OkxConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let credentials = Credentials::new(required_env("OKX_API_KEY")?, required_env("OKX_SECRET_KEY")?)
            .with_passphrase(optional_env("OKX_PASSPHRASE").unwrap_or_default());

        Ok(OkxConfig {
            credentials,
            base_url: optional_env("OKX_BASE_URL").unwrap_or_else(|| OKX_BASE_URL.to_string()),
            simulated: match optional_env("OKX_SIMULATED") {
                Some(v) => parse_bool("OKX_SIMULATED", &v)?,
                None => true,
            },
            http_timeout: http_timeout()?,
        })
    }
}

fn http_timeout() -> Result<Duration> {
    let secs = parsed_env("HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Ok(Duration::from_secs(secs))
}

fn required_env(key: &str) -> Result<String> {
    match optional_env(key) {
        Some(v) => Ok(v),
        None => Err(Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))),
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    optional_env(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("{key} has an invalid value: '{v}'")))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key} must be a boolean, got: '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::new("abcdef123", "super-secret").with_passphrase("pass-phrase");
        let printed = format!("{creds:?}");
        assert!(printed.contains("abcd****"));
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("pass-phrase"));
        assert!(!printed.contains("ef123"));
    }

    #[test]
    fn bool_values_are_parsed_leniently() {
        assert!(parse_bool("K", "TRUE").unwrap());
        assert!(parse_bool("K", " 1 ").unwrap());
        assert!(!parse_bool("K", "off").unwrap());
        assert!(matches!(parse_bool("K", "maybe"), Err(Error::Config(_))));
    }

    #[test]
    fn missing_required_variable_is_a_config_error() {
        let err = required_env("PROBE_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("PROBE_TEST_SURELY_UNSET_VARIABLE"));
    }
}
