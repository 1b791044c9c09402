//! Error type for composition, signing and broadcast.

use thiserror::Error;

use crate::chain::ChainError;
use crate::crypto::KeyError;
use crate::transaction::AbiError;

/// Everything that can end a composition without a committed transaction.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A composition scope is already open on this composer.
    #[error("Callback during a transaction")]
    ConcurrentComposition,

    /// The builder failed. The builder's own error is kept as-is, so its
    /// message is unchanged and it can be downcast.
    #[error(transparent)]
    Rollback(anyhow::Error),

    /// A handle was used after its composition finished.
    #[error("transaction builder already finished")]
    ScopeClosed,

    #[error("no signing keys available")]
    NoSigningKeys,

    #[error("unknown key")]
    UnknownContract { code: String },

    #[error("contract '{code}' has no action '{action}'")]
    UnknownAction { code: String, action: String },

    #[error(transparent)]
    InvalidArguments(#[from] AbiError),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("message {index}: {reason}")]
    InvalidMessage { index: usize, reason: String },

    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("key provider failed: {0}")]
    KeyProvider(anyhow::Error),

    #[error("signing failed: {0}")]
    Signing(anyhow::Error),

    #[error("failed to read chain head: {0}")]
    Header(ChainError),

    #[error("failed to load contract: {0}")]
    Lookup(ChainError),

    #[error("required keys lookup failed: {0}")]
    Resolver(ChainError),

    #[error("broadcast failed: {0}")]
    Broadcast(ChainError),
}

impl ComposeError {
    /// True when the node (or the ABI lookup) did not recognise an account,
    /// contract or key.
    pub fn is_unknown_key(&self) -> bool {
        match self {
            Self::UnknownContract { .. } => true,
            Self::Header(e) | Self::Lookup(e) | Self::Resolver(e) | Self::Broadcast(e) => {
                e.is_unknown_key()
            }
            _ => false,
        }
    }

    /// Undo the `Rollback` wrapping when the builder only forwarded an error
    /// the composer raised itself.
    pub(crate) fn unwrap_rollback(self) -> Self {
        match self {
            Self::Rollback(err) => match err.downcast::<ComposeError>() {
                Ok(inner) => inner,
                Err(err) => Self::Rollback(err),
            },
            other => other,
        }
    }
}
