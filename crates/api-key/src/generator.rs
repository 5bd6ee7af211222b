//! API key generation and hashing.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix for live keys.
const LIVE_PREFIX: &str = "tv_live_";
/// Prefix for test-mode keys.
const TEST_PREFIX: &str = "tv_test_";
/// Random bytes per secret; hex-encodes to 48 characters.
const SECRET_BYTES: usize = 24;
/// Characters of the random portion kept for display.
const DISPLAY_PREFIX_LEN: usize = 8;

/// A freshly generated key and its storable parts.
///
/// `key` is the one-time plaintext secret; only `key_hash` and
/// `key_prefix` are ever persisted.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    /// The full plaintext secret, shown once.
    pub key: String,
    /// SHA-256 hex digest of the full key.
    pub key_hash: String,
    /// First characters of the random portion, for display.
    pub key_prefix: String,
}

/// Generates a live API key.
pub fn generate_api_key() -> GeneratedKey {
    generate_with_prefix(LIVE_PREFIX)
}

/// Generates a test-mode API key.
pub fn generate_test_api_key() -> GeneratedKey {
    generate_with_prefix(TEST_PREFIX)
}

fn generate_with_prefix(prefix: &str) -> GeneratedKey {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let body = hex::encode(bytes);

    let key = format!("{prefix}{body}");
    GeneratedKey {
        key_hash: hash_key(&key),
        key_prefix: body[..DISPLAY_PREFIX_LEN].to_string(),
        key,
    }
}

/// Hashes an API key for storage.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Verifies a plaintext key against a stored hash.
pub fn verify_key(key: &str, hash: &str) -> bool {
    constant_time_compare(&hash_key(key), hash)
}

/// Checks the `tv_live_`/`tv_test_` + 48 lowercase hex shape.
pub fn is_valid_key_format(key: &str) -> bool {
    let body = key
        .strip_prefix(LIVE_PREFIX)
        .or_else(|| key.strip_prefix(TEST_PREFIX));

    match body {
        Some(body) => {
            body.len() == SECRET_BYTES * 2
                && body.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        }
        None => false,
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
