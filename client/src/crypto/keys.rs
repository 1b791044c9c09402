//! # Key Management
//!
//! Ed25519 keys in the text encodings the chain API speaks.
//!
//! - A **private key** string is `base58(seed ‖ checksum)`, where `seed` is
//!   the 32-byte Ed25519 secret and `checksum` the first four bytes of
//!   `sha256(seed)`. A raw 64-character hex seed is accepted as well.
//! - A **public key** string is the [`PUBLIC_KEY_PREFIX`] followed by
//!   `base58(point ‖ checksum)`.
//! - A **signature** string is the hex encoding of the 64-byte signature.
//!
//! Key material is never logged. `Debug` on [`PrivateKey`] prints the public
//! half only.
//!
//! [`PUBLIC_KEY_PREFIX`]: crate::config::PUBLIC_KEY_PREFIX

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{checksum, CHECKSUM_LENGTH};
use crate::config::PUBLIC_KEY_PREFIX;

/// Errors raised while decoding key or signature strings.
///
/// Messages never echo the offending input: a half-pasted private key in an
/// error log is still a leaked private key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid private key encoding")]
    InvalidPrivateKey,

    #[error("invalid public key encoding")]
    InvalidPublicKey,

    #[error("key checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid signature encoding")]
    InvalidSignature,
}

/// The signing primitive handed to sign providers: `(buffer, private key
/// string) -> hex signature`.
pub type SignFn = fn(&[u8], &str) -> Result<String, KeyError>;

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// An Ed25519 private key.
///
/// Deliberately not `Serialize`. Turning a key into text is an explicit
/// [`PrivateKey::to_encoded`] call.
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign `buf` and return the hex-encoded signature.
    ///
    /// Ed25519 is deterministic, so the same key and buffer always produce
    /// the same string.
    pub fn sign(&self, buf: &[u8]) -> String {
        hex::encode(self.signing_key.sign(buf).to_bytes())
    }

    /// `base58(seed ‖ checksum)`.
    pub fn to_encoded(&self) -> String {
        let seed = self.signing_key.to_bytes();
        let mut raw = Vec::with_capacity(SECRET_KEY_LENGTH + CHECKSUM_LENGTH);
        raw.extend_from_slice(&seed);
        raw.extend_from_slice(&checksum(&seed));
        bs58::encode(raw).into_string()
    }

    fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPrivateKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_seed(&seed))
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == SECRET_KEY_LENGTH * 2 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::from_hex(s);
        }

        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        if raw.len() != SECRET_KEY_LENGTH + CHECKSUM_LENGTH {
            return Err(KeyError::InvalidPrivateKey);
        }
        let (seed, sum) = raw.split_at(SECRET_KEY_LENGTH);
        if checksum(seed) != sum {
            return Err(KeyError::ChecksumMismatch);
        }
        let seed: [u8; SECRET_KEY_LENGTH] =
            seed.try_into().map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_seed(&seed))
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(pub={})", self.public_key())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// An Ed25519 public key, displayed with the chain's key prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl PublicKey {
    /// Raw point bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Check a hex signature over `buf`. Any decoding problem is just `false`.
    pub fn verify(&self, buf: &[u8], signature: &str) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig) = decode_signature(signature) else {
            return false;
        };
        verifying_key.verify(buf, &sig).is_ok()
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .ok_or(KeyError::InvalidPublicKey)?;
        let raw = bs58::decode(body)
            .into_vec()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        if raw.len() != 32 + CHECKSUM_LENGTH {
            return Err(KeyError::InvalidPublicKey);
        }
        let (point, sum) = raw.split_at(32);
        if checksum(point) != sum {
            return Err(KeyError::ChecksumMismatch);
        }
        let bytes: [u8; 32] = point.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        // Reject byte strings that are not curve points.
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(32 + CHECKSUM_LENGTH);
        raw.extend_from_slice(&self.bytes);
        raw.extend_from_slice(&checksum(&self.bytes));
        write!(f, "{}{}", PUBLIC_KEY_PREFIX, bs58::encode(raw).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Sign `buf` with an encoded private key. This is the [`SignFn`] every
/// sign provider receives.
pub fn sign(buf: &[u8], private_key: &str) -> Result<String, KeyError> {
    let key: PrivateKey = private_key.parse()?;
    Ok(key.sign(buf))
}

/// Verify a hex signature against an encoded public key.
pub fn verify(buf: &[u8], signature: &str, public_key: &str) -> bool {
    match public_key.parse::<PublicKey>() {
        Ok(key) => key.verify(buf, signature),
        Err(_) => false,
    }
}

fn decode_signature(s: &str) -> Result<Signature, KeyError> {
    let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
    let arr: [u8; 64] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidSignature)?;
    Ok(Signature::from_bytes(&arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_encoding_roundtrip() {
        let key = PrivateKey::generate();
        let restored: PrivateKey = key.to_encoded().parse().unwrap();
        assert_eq!(key.public_key(), restored.public_key());
    }

    #[test]
    fn hex_seed_is_accepted() {
        let seed = [7u8; 32];
        let from_hex: PrivateKey = hex::encode(seed).parse().unwrap();
        assert_eq!(from_hex.public_key(), PrivateKey::from_seed(&seed).public_key());
    }

    #[test]
    fn corrupted_private_key_fails_checksum() {
        let key = PrivateKey::from_seed(&[1u8; 32]);
        let mut raw = bs58::decode(key.to_encoded()).into_vec().unwrap();
        raw[0] ^= 0xFF;
        let tampered = bs58::encode(raw).into_string();
        assert_eq!(
            tampered.parse::<PrivateKey>().unwrap_err(),
            KeyError::ChecksumMismatch
        );
    }

    #[test]
    fn garbage_private_key_rejected() {
        assert!("not a key".parse::<PrivateKey>().is_err());
        assert!("deadbeef".parse::<PrivateKey>().is_err());
    }

    #[test]
    fn public_key_has_prefix_and_roundtrips() {
        let pk = PrivateKey::generate().public_key();
        let text = pk.to_string();
        assert!(text.starts_with(PUBLIC_KEY_PREFIX));
        assert_eq!(text.parse::<PublicKey>().unwrap(), pk);
    }

    #[test]
    fn public_key_without_prefix_rejected() {
        let pk = PrivateKey::generate().public_key().to_string();
        let stripped = pk.trim_start_matches(PUBLIC_KEY_PREFIX);
        assert_eq!(
            stripped.parse::<PublicKey>().unwrap_err(),
            KeyError::InvalidPublicKey
        );
    }

    #[test]
    fn sign_primitive_verifies() {
        let key = PrivateKey::generate();
        let sig = sign(b"buffer", &key.to_encoded()).unwrap();
        assert_eq!(sig.len(), 128);
        assert!(verify(b"buffer", &sig, &key.public_key().to_string()));
        assert!(!verify(b"other", &sig, &key.public_key().to_string()));
    }

    #[test]
    fn signatures_are_deterministic() {
        let key = PrivateKey::from_seed(&[9u8; 32]);
        assert_eq!(key.sign(b"same"), key.sign(b"same"));
    }

    #[test]
    fn malformed_signature_does_not_verify() {
        let key = PrivateKey::generate();
        assert!(!key.public_key().verify(b"buffer", "zz"));
        assert!(!key.public_key().verify(b"buffer", "abcd"));
    }

    #[test]
    fn debug_hides_secret() {
        let key = PrivateKey::generate();
        let shown = format!("{:?}", key);
        assert!(shown.starts_with("PrivateKey(pub="));
        assert!(!shown.contains(&key.to_encoded()));
    }

    #[test]
    fn encoded_form_is_seed_and_checksum() {
        let key = PrivateKey::from_seed(&[0x42; 32]);
        assert_eq!(
            key.to_encoded(),
            "WBVaWFoundqRbet928VeZtChcB6fYkrLq9SVruMP7vb29hauR"
        );
        assert!("46WPtSJH9Mc1rNbRaWo6k2v6Bm8dc1FuCFxS2n6gFo7GwNE6H"
            .parse::<PrivateKey>()
            .is_ok());
    }

    #[test]
    fn wif_keys_are_rejected() {
        assert!("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3"
            .parse::<PrivateKey>()
            .is_err());
    }
}
