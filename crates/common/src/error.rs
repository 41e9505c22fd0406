use thiserror::Error;

/// Binance error code for a request timestamp outside `recvWindow`.
pub const BINANCE_TIMESTAMP_SKEW: i64 = -1021;
/// Binance error code for an invalid key, IP restriction or missing permission.
pub const BINANCE_PERMISSION_DENIED: i64 = -2015;
/// Binance error code for an unrecognised or malformed parameter.
pub const BINANCE_INVALID_PARAMETER: i64 = -1104;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binance API error {code}: {msg}")]
    Binance { code: i64, msg: String },

    #[error("OKX API error {code}: {msg}")]
    Okx { code: String, msg: String },

    #[error("Unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by callers to decide between retry, abort and continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TimestampSkew,
    PermissionDenied,
    InvalidParameter,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Binance { code, .. } => match *code {
                BINANCE_TIMESTAMP_SKEW => ErrorKind::TimestampSkew,
                BINANCE_PERMISSION_DENIED => ErrorKind::PermissionDenied,
                BINANCE_INVALID_PARAMETER => ErrorKind::InvalidParameter,
                _ => ErrorKind::Other,
            },
            _ => ErrorKind::Other,
        }
    }

    /// Operator-facing hints for failures that a retry cannot fix.
    pub fn remediation(&self) -> &'static [&'static str] {
        match self.kind() {
            ErrorKind::PermissionDenied => &[
                "Invalid API key, IP restriction or missing permission.",
                "1. Log in to testnet.binance.vision and confirm the key has 'Trade' enabled.",
                "2. Requests from restricted regions may be rejected; try another egress IP.",
                "3. Generate a new key pair if the problem persists.",
            ],
            ErrorKind::InvalidParameter => {
                &["Invalid request parameter; remove or correct the offending parameter."]
            }
            ErrorKind::TimestampSkew => {
                &["Local clock is out of sync with the server; enable automatic time sync."]
            }
            ErrorKind::Other => &[],
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn binance(code: i64) -> Error {
        Error::Binance { code, msg: "x".into() }
    }

    #[test]
    fn binance_codes_map_to_kinds() {
        assert_eq!(binance(-1021).kind(), ErrorKind::TimestampSkew);
        assert_eq!(binance(-2015).kind(), ErrorKind::PermissionDenied);
        assert_eq!(binance(-1104).kind(), ErrorKind::InvalidParameter);
        assert_eq!(binance(-1121).kind(), ErrorKind::Other);
    }

    #[test]
    fn okx_errors_are_never_retryable_kinds() {
        let err = Error::Okx { code: "50113".into(), msg: "Invalid sign".into() };
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.remediation().is_empty());
    }

    #[test]
    fn permission_errors_carry_hints() {
        assert!(binance(-2015).remediation().len() > 1);
    }
}
