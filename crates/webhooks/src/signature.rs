//! HMAC signature generation and verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies webhook payloads with a shared secret.
///
/// The signature carried in `X-TrackVerse-Signature` is the hex
/// HMAC-SHA256 of the raw request body.
pub struct WebhookSigner {
    secret: String,
}

impl WebhookSigner {
    /// Creates a new signer with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Generates the signature for a raw payload.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a signature against the payload using a constant-time
    /// comparison.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        constant_time_compare(&self.sign(payload), signature)
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = WebhookSigner::new("test-secret");
        let payload = br#"{"id":"d1","event":"pr.set"}"#;

        let signature = signer.sign(payload);
        assert!(signer.verify(payload, &signature));
    }

    #[test]
    fn test_mutated_payload_fails() {
        let signer = WebhookSigner::new("test-secret");
        let signature = signer.sign(b"payload");

        assert!(!signer.verify(b"paymoad", &signature));
        assert!(!signer.verify(b"payload!", &signature));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let payload = b"payload";
        let signature = WebhookSigner::new("secret-a").sign(payload);

        assert!(!WebhookSigner::new("secret-b").verify(payload, &signature));
        // One byte off.
        assert!(!WebhookSigner::new("secret-A").verify(payload, &signature));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let signer = WebhookSigner::new("test-secret");
        let mut signature = signer.sign(b"payload");

        let last = signature.pop().unwrap();
        let flipped = if last == '0' { '1' } else { '0' };
        signature.push(flipped);
        assert!(!signer.verify(b"payload", &signature));
    }

    #[test]
    fn test_signature_is_hex() {
        let signature = WebhookSigner::new("s").sign(b"p");
        assert_eq!(signature.len(), 64);
        assert!(signature.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
