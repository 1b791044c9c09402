//! The chain API seam: request/response types and the [`ChainApi`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transaction::{ContractAbi, Transaction};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures talking to a node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The node does not know the account, contract or key in question.
    /// The message is fixed because callers match on it.
    #[error("unknown key")]
    UnknownKey { key: String },

    /// The node answered with a non-success status.
    #[error("node error ({status}): {message}")]
    Node { status: u16, message: String },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be understood.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ChainError {
    pub fn is_unknown_key(&self) -> bool {
        matches!(self, Self::UnknownKey { .. })
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Head-of-chain summary returned by `get_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Hex chain id. Older nodes omit it.
    #[serde(default)]
    pub chain_id: Option<String>,
    pub head_block_num: u32,
    pub head_block_id: String,
    pub head_block_time: DateTime<Utc>,
    #[serde(default)]
    pub last_irreversible_block_num: u32,
}

impl ChainInfo {
    /// Chain id bytes for the signing buffer. Empty when the node reports
    /// none; a non-hex id contributes its text bytes.
    pub fn chain_id_bytes(&self) -> Vec<u8> {
        match &self.chain_id {
            Some(id) => hex::decode(id).unwrap_or_else(|_| id.as_bytes().to_vec()),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_num: u32,
    pub id: String,
    pub previous: String,
    pub timestamp: DateTime<Utc>,
    /// IDs of the transactions included in the block.
    #[serde(default)]
    pub transactions: Vec<String>,
}

/// The ordered subset of offered public keys that must sign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredKeys {
    pub required_keys: Vec<String>,
}

/// What the node returns after accepting a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushReceipt {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: serde_json::Value,
}

// ---------------------------------------------------------------------------
// ChainApi
// ---------------------------------------------------------------------------

/// Read and write access to a chain node.
///
/// Implementations must be cheap to share: the composer holds one behind an
/// `Arc` and may call it from any task.
#[async_trait]
pub trait ChainApi: Send + Sync {
    async fn get_info(&self) -> Result<ChainInfo, ChainError>;

    async fn get_block(&self, block_num: u32) -> Result<Block, ChainError>;

    /// ABI of the contract deployed at `account`. Unknown or code-less
    /// accounts fail with [`ChainError::UnknownKey`].
    async fn get_code(&self, account: &str) -> Result<ContractAbi, ChainError>;

    /// Which of `available_keys` must sign `transaction`, in signing order.
    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[String],
    ) -> Result<RequiredKeys, ChainError>;

    async fn push_transaction(&self, transaction: &Transaction) -> Result<PushReceipt, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_display_is_fixed() {
        let err = ChainError::UnknownKey { key: "nosuch".into() };
        assert_eq!(err.to_string(), "unknown key");
        assert!(err.is_unknown_key());
        assert!(!ChainError::Transport("x".into()).is_unknown_key());
    }

    #[test]
    fn chain_id_bytes() {
        let mut info = ChainInfo {
            chain_id: Some("0a0b".into()),
            head_block_num: 1,
            head_block_id: String::new(),
            head_block_time: Utc::now(),
            last_irreversible_block_num: 0,
        };
        assert_eq!(info.chain_id_bytes(), vec![0x0a, 0x0b]);

        info.chain_id = Some("testnet".into());
        assert_eq!(info.chain_id_bytes(), b"testnet".to_vec());

        info.chain_id = None;
        assert!(info.chain_id_bytes().is_empty());
    }

    #[test]
    fn info_without_chain_id_deserializes() {
        let info: ChainInfo = serde_json::from_str(
            r#"{"head_block_num": 9, "head_block_id": "00", "head_block_time": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(info.chain_id, None);
        assert_eq!(info.last_irreversible_block_num, 0);
    }
}
