//! SHA-256 hashing for content-addressed identity keys.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 hash of in-memory data as a lowercase hex string.
///
/// # Example
///
/// ```
/// use adit_core::hash::sha256;
///
/// let digest = sha256(b"hello world");
/// assert_eq!(digest.len(), 64);
/// ```
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a UTF-8 string. Thin convenience wrapper over [`sha256`].
pub fn sha256_str(data: &str) -> String {
    sha256(data.as_bytes())
}
