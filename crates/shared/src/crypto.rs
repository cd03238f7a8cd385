//! Cryptographic utilities for admin key hashing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented key against a stored hex digest in constant time.
pub fn key_matches_hash(presented: &str, expected_hash: &str) -> bool {
    let actual = sha256_hex(presented);
    let expected = expected_hash.trim().to_ascii_lowercase();
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}
