//! # Composition
//!
//! The composer state machine and the pieces it drives.
//!
//! | File           | Contents                                          |
//! |----------------|---------------------------------------------------|
//! | `composer.rs`  | [`Composer`], options, results, explicit input    |
//! | `handle.rs`    | [`TransactionHandle`] given to builder callbacks  |
//! | `provider.rs`  | Key and sign provider traits and adapters         |
//! | `pipeline.rs`  | Key resolution and signing                        |
//! | `proxy.rs`     | [`ContractProxy`]                                 |
//! | `error.rs`     | [`ComposeError`]                                  |

mod composer;
mod error;
mod handle;
mod pipeline;
mod provider;
mod proxy;

pub use composer::{ComposeOptions, ComposeResult, Composer, ComposerBuilder, TransactionInput};
pub use error::ComposeError;
pub use handle::TransactionHandle;
pub use provider::{
    key_provider_fn, sign_provider_fn, FnKeyProvider, FnSignProvider, KeyProvider, KeyRequest,
    KeyringSigner, Keys, SignProvider, Signatures, SigningContext, StaticKeys,
};
pub use proxy::ContractProxy;
