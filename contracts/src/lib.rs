// Copyright (c) 2026 Quill Contributors. MIT License.
// See LICENSE for details.

//! # Quill Native Contracts
//!
//! The system contract every Quill chain deploys under the account `eos`,
//! described as an ABI the composer can bind arguments against, plus typed
//! wrappers for its actions:
//!
//! - **transfer**: move tokens between two accounts, with a memo.
//! - **newaccount**: create an account with owner and active keys, funded by
//!   a deposit from the creator.
//! - **okproducer**: approve or withdraw approval of a block producer.
//!
//! Typed actions are usable in two places. Inside a builder callback,
//! [`NativeActions`] adds `transfer`, `newaccount` and `okproducer` to the
//! [`TransactionHandle`](quill_client::TransactionHandle). On the
//! [`Composer`](quill_client::Composer) itself, [`NativeContract`] sends
//! each as a single-message transaction.

pub mod actions;
pub mod native;

pub use actions::{NativeAction, NativeActions, NativeContract, NewAccount, OkProducer, Transfer};
pub use native::{native_abi, with_native_abi, SYSTEM_CONTRACT};
