// Copyright (c) 2026 Quill Contributors. MIT License.
// See LICENSE for details.

//! # Quill Client
//!
//! Quill composes, signs, and submits transactions to a chain node over its
//! HTTP chain API. The interesting part is not the HTTP plumbing; it is the
//! composition pipeline that sits in front of it:
//!
//! 1. A caller opens a composition scope on a [`Composer`] and pushes one or
//!    more messages into it, either with a builder callback or as a single
//!    action shorthand.
//! 2. When the builder finishes cleanly, the composer asks the configured
//!    key provider for candidate keys and the chain for the subset that must
//!    sign.
//! 3. A pluggable sign provider turns the signing buffer into signatures.
//! 4. The signed transaction is broadcast, or handed back untouched when the
//!    caller asked for `broadcast: false`.
//!
//! If the builder fails, nothing leaves the process. Rollback is a discard,
//! not an undo.
//!
//! ## Architecture
//!
//! - **config**: Constants and the TOML-backed client configuration.
//! - **crypto**: Ed25519 keys in the chain's text encodings, and hashing.
//! - **transaction**: Messages, transactions, ABI-driven argument binding.
//! - **chain**: The [`ChainApi`] seam, an HTTP node client, and an
//!   in-memory chain for tests and offline use.
//! - **compose**: The composer state machine, providers, the signing
//!   pipeline, and the contract proxy.

pub mod chain;
pub mod compose;
pub mod config;
pub mod crypto;
pub mod transaction;

pub use chain::{ChainApi, ChainError, HttpChain, MemoryChain};
pub use compose::{
    ComposeError, ComposeOptions, ComposeResult, Composer, ComposerBuilder, ContractProxy,
    KeyProvider, SignProvider, TransactionHandle, TransactionInput,
};
pub use config::{ClientConfig, ComposerConfig};
pub use transaction::{ActionArgs, Authorization, ContractAbi, Message, MessageData, Transaction};
