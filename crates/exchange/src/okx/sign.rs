use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Signature for the `OK-ACCESS-SIGN` header: lowercase hex HMAC-SHA256 of
/// `timestamp + method + request_path + body`, keyed by the account secret.
///
/// `request_path` includes the `/api/v5` prefix and, for GET requests, the
/// query string. `body` is empty for GET.
pub fn sign(secret: &str, timestamp: &str, method: &str, request_path: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_request_regression_fixture() {
        let digest = sign("test-secret", "1690000000000", "GET", "/api/v5/account/balance", "");
        assert_eq!(
            digest,
            "f49550a171adfdd0d72200a25f57a2fd4f202ad4f64fb07d0619e012cf884b2a"
        );
    }

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        let digest = sign("k", "1", "POST", "/api/v5/trade/order", r#"{"sz":"1"}"#);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
