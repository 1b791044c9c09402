//! Transaction construction and canonical encoding.
//!
//! The [`TransactionBuilder`] produces an unsigned [`Transaction`] whose
//! scope is the sorted union of every account the messages touch. Signing is
//! not the builder's concern; the composer attaches signatures afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{Message, MessageData};
use crate::chain::{ChainError, ChainInfo};
use crate::crypto::hash::double_sha256;

// ---------------------------------------------------------------------------
// TransactionHeader
// ---------------------------------------------------------------------------

/// The chain-supplied fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHeader {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: DateTime<Utc>,
}

impl TransactionHeader {
    /// Header referencing the node's current head block.
    ///
    /// `ref_block_prefix` is the little-endian `u32` at bytes 8..12 of the
    /// head block id.
    pub fn from_chain_info(info: &ChainInfo, expire_in_secs: u32) -> Result<Self, ChainError> {
        let id = hex::decode(&info.head_block_id)
            .map_err(|e| ChainError::Decode(format!("head_block_id: {}", e)))?;
        let prefix: [u8; 4] = id
            .get(8..12)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Decode("head_block_id shorter than 12 bytes".into()))?;

        Ok(Self {
            ref_block_num: (info.head_block_num & 0xffff) as u16,
            ref_block_prefix: u32::from_le_bytes(prefix),
            expiration: whole_seconds(
                info.head_block_time + Duration::seconds(i64::from(expire_in_secs)),
            ),
        })
    }

    /// Header built from the local clock alone, with no reference block.
    /// Used when a transaction is neither signed nor broadcast.
    pub fn local(expire_in_secs: u32) -> Self {
        Self {
            ref_block_num: 0,
            ref_block_prefix: 0,
            expiration: whole_seconds(Utc::now() + Duration::seconds(i64::from(expire_in_secs))),
        }
    }
}

// The wire format carries seconds; dropping the fraction keeps a JSON
// round trip lossless.
fn whole_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(t.timestamp(), 0).unwrap_or(t)
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A chain transaction: an ordered list of messages executed atomically.
///
/// # Canonical Byte Format
///
/// [`Transaction::signable_bytes`] serializes, in order: `ref_block_num`
/// (u16 LE), `ref_block_prefix` (u32 LE), expiration seconds (i64 LE), the
/// scope (count then NUL-terminated names), and each message (code, type,
/// authorizations, then a flagged, length-prefixed payload). Signatures are
/// excluded, so the ID is stable across signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: DateTime<Utc>,
    /// Sorted, de-duplicated account names the messages read or write.
    pub scope: Vec<String>,
    pub messages: Vec<Message>,
    /// Hex signatures, one per required key in resolver order.
    #[serde(default)]
    pub signatures: Vec<String>,
}

impl Transaction {
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + self.messages.len() * 96);

        buf.extend_from_slice(&self.ref_block_num.to_le_bytes());
        buf.extend_from_slice(&self.ref_block_prefix.to_le_bytes());
        buf.extend_from_slice(&self.expiration.timestamp().to_le_bytes());

        buf.extend_from_slice(&(self.scope.len() as u32).to_le_bytes());
        for account in &self.scope {
            push_str(&mut buf, account);
        }

        buf.extend_from_slice(&(self.messages.len() as u32).to_le_bytes());
        for msg in &self.messages {
            push_str(&mut buf, &msg.code);
            push_str(&mut buf, &msg.action);

            buf.extend_from_slice(&(msg.authorization.len() as u32).to_le_bytes());
            for auth in &msg.authorization {
                push_str(&mut buf, &auth.account);
                push_str(&mut buf, &auth.permission);
            }

            // Payload form flag, then length-prefixed bytes.
            buf.push(match msg.data {
                MessageData::Structured(_) => 0x00,
                MessageData::Hex(_) => 0x01,
            });
            let payload = msg.data.payload_bytes();
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(&payload);
        }

        buf
    }

    /// `hex(double_sha256(signable_bytes))`.
    pub fn id(&self) -> String {
        hex::encode(double_sha256(&self.signable_bytes()))
    }

    /// The bytes a signer signs: chain id followed by the signable bytes.
    /// Binding the chain id stops a signature being replayed on another
    /// chain.
    pub fn signing_buffer(&self, chain_id: &[u8]) -> Vec<u8> {
        let body = self.signable_bytes();
        let mut buf = Vec::with_capacity(chain_id.len() + body.len());
        buf.extend_from_slice(chain_id);
        buf.extend_from_slice(&body);
        buf
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Authorization accounts in first-appearance order, without repeats.
    pub fn authorizing_accounts(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.messages
            .iter()
            .flat_map(|m| m.authorization.iter())
            .filter(|a| seen.insert(a.account.as_str()))
            .map(|a| a.account.clone())
            .collect()
    }
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0x00);
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`]s.
///
/// ```rust
/// use quill_client::transaction::{Authorization, Message, TransactionBuilder, TransactionHeader};
/// use serde_json::json;
///
/// let tx = TransactionBuilder::new(TransactionHeader::local(60))
///     .message(Message::new(
///         "eos",
///         "transfer",
///         json!({"from": "inita", "to": "initb", "amount": 1, "memo": ""}),
///         vec![Authorization::new("inita", "active")],
///     ))
///     .scope(["initb"])
///     .build();
///
/// assert_eq!(tx.scope, vec!["inita", "initb"]);
/// ```
pub struct TransactionBuilder {
    header: TransactionHeader,
    scope: BTreeSet<String>,
    messages: Vec<Message>,
}

impl TransactionBuilder {
    pub fn new(header: TransactionHeader) -> Self {
        Self {
            header,
            scope: BTreeSet::new(),
            messages: Vec::new(),
        }
    }

    /// Adds accounts to the scope beyond those named in authorizations.
    pub fn scope<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.extend(accounts.into_iter().map(Into::into));
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Consumes the builder. Every authorization account joins the scope.
    pub fn build(self) -> Transaction {
        let mut scope = self.scope;
        for msg in &self.messages {
            scope.extend(msg.authorization.iter().map(|a| a.account.clone()));
        }

        Transaction {
            ref_block_num: self.header.ref_block_num,
            ref_block_prefix: self.header.ref_block_prefix,
            expiration: self.header.expiration,
            scope: scope.into_iter().collect(),
            messages: self.messages,
            signatures: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
