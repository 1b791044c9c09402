//! # Cryptographic Primitives
//!
//! Everything the client needs to turn a signing buffer into a signature
//! string lives here. We do not implement curves; `ed25519-dalek` does the
//! actual work and this module only deals with the chain's text encodings.
//!
//! - **keys**: private/public key types, the `sign` primitive handed to
//!   sign providers, and signature verification.
//! - **hash**: SHA-256 helpers used for transaction IDs and key checksums.

pub mod hash;
pub mod keys;

pub use hash::{checksum, double_sha256, sha256};
pub use keys::{sign, verify, KeyError, PrivateKey, PublicKey, SignFn};
