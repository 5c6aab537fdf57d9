//! Content hashing for option categories and build inputs.
//!
//! Rebuild decisions compare hashes of semantically relevant option
//! subsets, not file timestamps. The hash covers the canonical JSON
//! serialization of a value, so any two structurally equal values map to
//! the same digest regardless of how they were produced.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute the SHA-256 content hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> ContentHash {
    let json = serde_json::to_vec(value).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hasher.finalize().into()
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hash a value straight to its hex form.
pub fn content_hash_hex<T: Serialize>(value: &T) -> String {
    hash_hex(&content_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_hash() {
        let h1 = content_hash(&"hello world");
        let h2 = content_hash(&"hello world");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_inputs_different_hash() {
        let h1 = content_hash(&"hello");
        let h2 = content_hash(&"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_hex_format() {
        let h = content_hash(&42u32);
        let hex = hash_hex(&h);
        assert_eq!(hex.len(), 64); // 32 bytes * 2 hex chars each
    }
}
