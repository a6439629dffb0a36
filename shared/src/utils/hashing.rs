//! One-way hashing helpers for token material.
//!
//! Tokens are never stored verbatim anywhere in the system; every lookup key
//! (blacklist entries, metadata records, client bindings) is a SHA-256 digest
//! of the relevant material.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of arbitrary input.
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Hashes a serialized token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Derives a one-way hash over multiple context parts joined with a
/// separator that cannot appear in any single part's hash input ambiguously.
pub fn hash_parts(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}
