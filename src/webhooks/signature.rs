//! Webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs webhook payloads with a shared secret and delivers the
//! signature in the `X-Hub-Signature-256` header as `sha256=<hex>`. When a
//! secret is configured, verification happens before any parsing; deliveries
//! with a bad or absent signature are rejected at the HTTP layer.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a `sha256=<hex>` signature header into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, wrong algorithm,
/// invalid hex). Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 signature of a payload under the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a raw signature as a `sha256=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a webhook signature against the payload and secret.
///
/// Uses the HMAC library's constant-time comparison.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_verifies() {
        let payload = b"{\"action\":\"opened\"}";
        let secret = b"duty-secret";
        let header = format_signature_header(&compute_signature(payload, secret));
        assert!(verify_signature(payload, &header, secret));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = b"{\"action\":\"opened\"}";
        let header = format_signature_header(&compute_signature(payload, b"right"));
        assert!(!verify_signature(payload, &header, b"wrong"));
    }

    #[test]
    fn tampered_payload_fails() {
        let secret = b"duty-secret";
        let header = format_signature_header(&compute_signature(b"original", secret));
        assert!(!verify_signature(b"tampered", &header, secret));
    }

    #[test]
    fn malformed_headers_fail() {
        assert!(parse_signature_header("abcd1234").is_none());
        assert!(parse_signature_header("sha1=abcd1234").is_none());
        assert!(parse_signature_header("sha256=not-hex").is_none());
        assert!(!verify_signature(b"x", "sha256=zz", b"secret"));
    }
}
