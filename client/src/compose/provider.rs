//! Key and sign providers.
//!
//! Both traits return a [`BoxFuture`], so a provider that already has its
//! answer and one that has to ask a wallet over the network look the same
//! to the composer. Closures can be adapted with [`key_provider_fn`] and
//! [`sign_provider_fn`].

use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;

use crate::crypto::SignFn;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// One-or-many results
// ---------------------------------------------------------------------------

/// Private keys returned by a [`KeyProvider`].
#[derive(Clone, PartialEq, Eq)]
pub enum Keys {
    One(String),
    Many(Vec<String>),
}

impl Keys {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(key) => vec![key],
            Self::Many(keys) => keys,
        }
    }
}

// Private keys never reach a log line.
impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(_) => write!(f, "Keys::One(..)"),
            Self::Many(keys) => write!(f, "Keys::Many({} keys)", keys.len()),
        }
    }
}

impl From<String> for Keys {
    fn from(key: String) -> Self {
        Self::One(key)
    }
}

impl From<&str> for Keys {
    fn from(key: &str) -> Self {
        Self::One(key.to_string())
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Self::Many(keys)
    }
}

/// Hex signatures returned by a [`SignProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signatures {
    One(String),
    Many(Vec<String>),
}

impl Signatures {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(sig) => vec![sig],
            Self::Many(sigs) => sigs,
        }
    }
}

impl From<String> for Signatures {
    fn from(sig: String) -> Self {
        Self::One(sig)
    }
}

impl From<Vec<String>> for Signatures {
    fn from(sigs: Vec<String>) -> Self {
        Self::Many(sigs)
    }
}

// ---------------------------------------------------------------------------
// KeyProvider
// ---------------------------------------------------------------------------

/// What a key provider is told about the transaction it is asked to fund.
#[derive(Debug, Clone)]
pub struct KeyRequest {
    pub transaction: Transaction,
}

/// Source of candidate private keys.
pub trait KeyProvider: Send + Sync {
    fn keys<'a>(&'a self, request: KeyRequest) -> BoxFuture<'a, anyhow::Result<Keys>>;
}

/// A fixed key list.
#[derive(Clone)]
pub struct StaticKeys {
    keys: Vec<String>,
}

impl StaticKeys {
    pub fn new(keys: impl Into<Keys>) -> Self {
        Self {
            keys: keys.into().into_vec(),
        }
    }
}

impl KeyProvider for StaticKeys {
    fn keys<'a>(&'a self, _request: KeyRequest) -> BoxFuture<'a, anyhow::Result<Keys>> {
        future::ready(Ok(Keys::Many(self.keys.clone()))).boxed()
    }
}

/// Adapter returned by [`key_provider_fn`].
pub struct FnKeyProvider<F>(F);

/// Wrap an async closure as a [`KeyProvider`].
///
/// ```rust
/// use quill_client::compose::key_provider_fn;
///
/// const KEY: &str = "46WPtSJH9Mc1rNbRaWo6k2v6Bm8dc1FuCFxS2n6gFo7GwNE6H";
///
/// let provider = key_provider_fn(|_request| async { anyhow::Ok(KEY) });
/// # let _ = provider;
/// # assert!(KEY.parse::<quill_client::crypto::PrivateKey>().is_ok());
/// ```
pub fn key_provider_fn<F, Fut, K>(f: F) -> FnKeyProvider<F>
where
    F: Fn(KeyRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<K>> + Send + 'static,
    K: Into<Keys>,
{
    FnKeyProvider(f)
}

impl<F, Fut, K> KeyProvider for FnKeyProvider<F>
where
    F: Fn(KeyRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<K>> + Send + 'static,
    K: Into<Keys>,
{
    fn keys<'a>(&'a self, request: KeyRequest) -> BoxFuture<'a, anyhow::Result<Keys>> {
        (self.0)(request).map(|r| r.map(Into::into)).boxed()
    }
}

// ---------------------------------------------------------------------------
// SignProvider
// ---------------------------------------------------------------------------

/// Everything a sign provider gets for one signing round.
///
/// `required_keys[i]` is the public half of `private_keys[i]`. Both lists
/// are empty when the composer has no key provider and the sign provider
/// picks keys itself.
pub struct SigningContext {
    /// Chain id followed by the transaction's signable bytes.
    pub buf: Vec<u8>,
    /// The signing primitive: `sign(buf, private_key) -> hex signature`.
    pub sign: SignFn,
    pub transaction: Transaction,
    pub required_keys: Vec<String>,
    pub private_keys: Vec<String>,
}

impl fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningContext")
            .field("buf_len", &self.buf.len())
            .field("transaction_id", &self.transaction.id())
            .field("required_keys", &self.required_keys)
            .field("private_keys", &self.private_keys.len())
            .finish()
    }
}

/// Turns a signing context into signatures, one per required key.
pub trait SignProvider: Send + Sync {
    fn sign<'a>(&'a self, ctx: SigningContext) -> BoxFuture<'a, anyhow::Result<Signatures>>;
}

/// The default sign provider: signs with every private key in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringSigner;

impl SignProvider for KeyringSigner {
    fn sign<'a>(&'a self, ctx: SigningContext) -> BoxFuture<'a, anyhow::Result<Signatures>> {
        let result = ctx
            .private_keys
            .iter()
            .map(|key| (ctx.sign)(&ctx.buf, key).map_err(anyhow::Error::from))
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Signatures::Many);
        future::ready(result).boxed()
    }
}

/// Adapter returned by [`sign_provider_fn`].
pub struct FnSignProvider<F>(F);

/// Wrap an async closure as a [`SignProvider`].
pub fn sign_provider_fn<F, Fut, S>(f: F) -> FnSignProvider<F>
where
    F: Fn(SigningContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<S>> + Send + 'static,
    S: Into<Signatures>,
{
    FnSignProvider(f)
}

impl<F, Fut, S> SignProvider for FnSignProvider<F>
where
    F: Fn(SigningContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<S>> + Send + 'static,
    S: Into<Signatures>,
{
    fn sign<'a>(&'a self, ctx: SigningContext) -> BoxFuture<'a, anyhow::Result<Signatures>> {
        (self.0)(ctx).map(|r| r.map(Into::into)).boxed()
    }
}
