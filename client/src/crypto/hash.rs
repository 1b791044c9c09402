//! # Hashing Utilities
//!
//! SHA-256 is the only hash the client needs: transaction IDs are
//! `double_sha256` of the signable bytes, and key strings carry a 4-byte
//! SHA-256 checksum so a mistyped key fails loudly instead of signing with
//! garbage.

use sha2::{Digest, Sha256};

/// Length of the checksum appended to encoded keys.
pub const CHECKSUM_LENGTH: usize = 4;

/// Compute the SHA-256 digest of `data`.
///
/// # Example
///
/// ```
/// use quill_client::crypto::sha256;
///
/// let hash = sha256(b"quill");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `SHA256(SHA256(data))`. Used for transaction IDs so the ID is immune to
/// length-extension on the signable bytes.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// First four bytes of `SHA256(data)`.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = sha256(data);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&digest[..CHECKSUM_LENGTH]);
    out
}
