//! # Transaction Module
//!
//! The data model the composer works on.
//!
//! ```text
//! types.rs    Authorization, Message, MessageData, account-name rules
//! builder.rs  Transaction, TransactionHeader, fluent TransactionBuilder
//! abi.rs      Contract ABIs and binding of positional/named action args
//! ```
//!
//! ## Design Decisions
//!
//! - A transaction's `scope` is always sorted and de-duplicated. Two
//!   transactions touching the same accounts hash the same no matter which
//!   message mentioned an account first.
//! - Transaction IDs are `double_sha256` of [`Transaction::signable_bytes`],
//!   which excludes `signatures`. The ID is known before signing and does
//!   not move afterwards.
//! - Structured payloads are encoded with `serde_json` for hashing. Its map
//!   type is ordered by key, so the encoding is canonical.

pub mod abi;
pub mod builder;
pub mod types;

pub use abi::{AbiError, ActionArgs, ActionDef, ContractAbi, FieldDef};
pub use builder::{Transaction, TransactionBuilder, TransactionHeader};
pub use types::{is_valid_account_name, Authorization, Message, MessageData};
