//! The transaction composer.
//!
//! ```text
//!   IDLE ──open──► COMPOSING ──builder Ok──► SIGNING ──► COMMITTED
//!    ▲                │                        │            │
//!    │           builder Err                 error        broadcast?
//!    │                ▼                        ▼            ▼
//!    └──────── ROLLED_BACK ◄─────────────── FAILED     BROADCAST
//! ```
//!
//! One composition scope may be open per [`Composer`] at a time. The scope
//! is an RAII guard, so it is released on every exit path: success, error,
//! panic, or the caller dropping the future.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::error::ComposeError;
use super::handle::TransactionHandle;
use super::pipeline;
use super::provider::{KeyProvider, SignProvider};
use super::proxy::ContractProxy;
use crate::chain::{Block, ChainApi, ChainInfo, PushReceipt};
use crate::config::ComposerConfig;
use crate::transaction::{
    ActionArgs, ContractAbi, Message, Transaction, TransactionBuilder, TransactionHeader,
};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// What to do with a composed transaction. Both default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    pub broadcast: bool,
    pub sign: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            broadcast: true,
            sign: true,
        }
    }
}

impl ComposeOptions {
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    pub fn with_sign(mut self, sign: bool) -> Self {
        self.sign = sign;
        self
    }
}

/// A bare boolean sets `broadcast` and keeps signing on.
impl From<bool> for ComposeOptions {
    fn from(broadcast: bool) -> Self {
        Self::default().with_broadcast(broadcast)
    }
}

/// The outcome of a successful composition.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeResult {
    pub transaction_id: String,
    pub transaction: Transaction,
    /// Whether the node accepted the transaction.
    pub broadcast: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<PushReceipt>,
}

/// A transaction given as data rather than built through a handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    #[serde(default)]
    pub scope: Vec<String>,
    pub messages: Vec<Message>,
}

impl TransactionInput {
    pub fn new(scope: Vec<String>, messages: Vec<Message>) -> Self {
        Self { scope, messages }
    }

    /// Parse a `{scope, messages}` literal, naming the first missing or
    /// malformed field by message index.
    pub fn from_json(value: &Value) -> Result<Self, ComposeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ComposeError::InvalidTransaction("expected an object".into()))?;

        let scope = match obj.get("scope") {
            None | Some(Value::Null) => Vec::new(),
            Some(scope) => serde_json::from_value(scope.clone()).map_err(|_| {
                ComposeError::InvalidTransaction("scope must be a list of account names".into())
            })?,
        };

        let raw_messages = obj
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| ComposeError::InvalidTransaction("missing messages".into()))?;

        let mut messages = Vec::with_capacity(raw_messages.len());
        for (index, raw) in raw_messages.iter().enumerate() {
            let invalid = |reason: String| ComposeError::InvalidMessage { index, reason };
            let fields = raw
                .as_object()
                .ok_or_else(|| invalid("expected an object".into()))?;
            for field in ["code", "type", "data", "authorization"] {
                if !fields.contains_key(field) {
                    return Err(invalid(format!("missing {}", field)));
                }
            }
            let message: Message =
                serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;
            messages.push(message);
        }

        Ok(Self { scope, messages })
    }

    /// Structural checks on every message.
    pub fn validate(&self) -> Result<(), ComposeError> {
        for (index, message) in self.messages.iter().enumerate() {
            message
                .validate()
                .map_err(|reason| ComposeError::InvalidMessage { index, reason })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

struct ScopeState {
    id: u64,
    code: String,
    opened_at: Instant,
}

struct ScopeGuard<'a> {
    slot: &'a Mutex<Option<ScopeState>>,
    id: u64,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.as_ref().map(|s| s.id) == Some(self.id) {
            if let Some(state) = slot.take() {
                debug!(
                    scope = state.id,
                    code = %state.code,
                    elapsed_ms = state.opened_at.elapsed().as_millis() as u64,
                    "composition scope released"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Accumulates messages into atomic transactions, signs and broadcasts them.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use quill_client::compose::{Composer, StaticKeys};
/// use quill_client::HttpChain;
/// use serde_json::json;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let chain = Arc::new(HttpChain::new("http://127.0.0.1:8888")?);
/// let composer = Composer::builder(chain)
///     .key_provider(StaticKeys::new("WBVaWFoundqRbet928VeZtChcB6fYkrLq9SVruMP7vb29hauR"))
///     .build();
///
/// let result = composer
///     .transaction(
///         |tr| async move {
///             tr.action("transfer", json!(["inita", "initb", 1, ""]))?;
///             tr.action("transfer", json!(["inita", "initc", 1, ""]))?;
///             anyhow::Ok(())
///         },
///         true,
///     )
///     .await?;
/// println!("{}", result.transaction_id);
/// # Ok(())
/// # }
/// ```
pub struct Composer {
    chain: Arc<dyn ChainApi>,
    config: ComposerConfig,
    key_provider: Option<Arc<dyn KeyProvider>>,
    sign_provider: Option<Arc<dyn SignProvider>>,
    abis: RwLock<HashMap<String, Arc<ContractAbi>>>,
    scope: Mutex<Option<ScopeState>>,
    next_scope_id: AtomicU64,
}

impl Composer {
    pub fn builder(chain: Arc<dyn ChainApi>) -> ComposerBuilder {
        ComposerBuilder {
            chain,
            config: ComposerConfig::default(),
            key_provider: None,
            sign_provider: None,
            abis: HashMap::new(),
        }
    }

    pub fn chain(&self) -> &Arc<dyn ChainApi> {
        &self.chain
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Whether a composition scope is currently open.
    pub fn is_composing(&self) -> bool {
        self.scope.lock().is_some()
    }

    pub async fn get_info(&self) -> Result<ChainInfo, ComposeError> {
        self.chain.get_info().await.map_err(ComposeError::Header)
    }

    pub async fn get_block(&self, block_num: u32) -> Result<Block, ComposeError> {
        self.chain
            .get_block(block_num)
            .await
            .map_err(ComposeError::Lookup)
    }

    /// Cache an ABI so lookups for `code` skip the network.
    pub fn register_abi(&self, code: impl Into<String>, abi: ContractAbi) {
        self.abis.write().insert(code.into(), Arc::new(abi));
    }

    /// Compose a transaction against the system contract.
    pub async fn transaction<F, Fut>(
        &self,
        build: F,
        options: impl Into<ComposeOptions>,
    ) -> Result<ComposeResult, ComposeError>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let code = self.config.system_contract.clone();
        self.compose_bound(code, None, build, options.into()).await
    }

    /// Single-message shorthand on the system contract.
    pub async fn action(
        &self,
        name: &str,
        args: impl Into<ActionArgs>,
        options: impl Into<ComposeOptions>,
    ) -> Result<ComposeResult, ComposeError> {
        let code = self.config.system_contract.clone();
        self.single_action(code, None, name, args.into(), options.into())
            .await
    }

    /// Submit a transaction given as data. Messages are checked
    /// structurally but not against any ABI.
    pub async fn push_transaction(
        &self,
        input: TransactionInput,
        options: impl Into<ComposeOptions>,
    ) -> Result<ComposeResult, ComposeError> {
        let _guard = self.open_scope("<explicit>")?;
        input.validate()?;
        let TransactionInput { scope, messages } = input;
        self.finish(messages, scope.into_iter().collect(), options.into())
            .await
    }

    /// A proxy exposing `code`'s actions. Unknown contracts fail with
    /// [`ComposeError::UnknownContract`].
    pub async fn contract(&self, code: &str) -> Result<ContractProxy<'_>, ComposeError> {
        let abi = self.resolve_abi(code).await?;
        Ok(ContractProxy::new(self, code.to_string(), abi))
    }

    // -----------------------------------------------------------------------
    // Internals shared with ContractProxy
    // -----------------------------------------------------------------------

    pub(crate) async fn compose_bound<F, Fut>(
        &self,
        code: String,
        abi: Option<Arc<ContractAbi>>,
        build: F,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let _guard = self.open_scope(&code)?;
        let abi = abi.or_else(|| self.cached_abi(&code));

        let handle = TransactionHandle::new(code.clone(), abi.clone(), &self.config);
        let outcome = build(handle.clone()).await;
        let draft = handle.close();

        if let Err(err) = outcome {
            warn!(discarded = draft.len(), error = %err, "composition rolled back");
            return Err(ComposeError::Rollback(err));
        }

        // The ABI is fetched only if an action was appended before it was known.
        let abi = match abi {
            None if draft.needs_abi() => Some(self.resolve_abi(&code).await?),
            abi => abi,
        };
        let (messages, scope) = draft.bind(abi.as_deref())?;
        self.finish(messages, scope, options).await
    }

    pub(crate) async fn single_action(
        &self,
        code: String,
        abi: Option<Arc<ContractAbi>>,
        name: &str,
        args: ActionArgs,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError> {
        self.compose_bound(
            code,
            abi,
            move |tr| async move {
                tr.action(name, args)?;
                anyhow::Ok(())
            },
            options,
        )
        .await
        .map_err(ComposeError::unwrap_rollback)
    }

    fn open_scope(&self, code: &str) -> Result<ScopeGuard<'_>, ComposeError> {
        let mut slot = self.scope.lock();
        if let Some(active) = slot.as_ref() {
            warn!(
                active = active.id,
                active_code = %active.code,
                "rejecting nested composition"
            );
            return Err(ComposeError::ConcurrentComposition);
        }

        let id = self.next_scope_id.fetch_add(1, Ordering::Relaxed);
        *slot = Some(ScopeState {
            id,
            code: code.to_string(),
            opened_at: Instant::now(),
        });
        debug!(scope = id, code, "composition scope opened");
        Ok(ScopeGuard {
            slot: &self.scope,
            id,
        })
    }

    fn cached_abi(&self, code: &str) -> Option<Arc<ContractAbi>> {
        self.abis.read().get(code).cloned()
    }

    async fn resolve_abi(&self, code: &str) -> Result<Arc<ContractAbi>, ComposeError> {
        if let Some(abi) = self.cached_abi(code) {
            return Ok(abi);
        }

        debug!(code, "fetching contract abi");
        let abi = self.chain.get_code(code).await.map_err(|e| {
            if e.is_unknown_key() {
                ComposeError::UnknownContract {
                    code: code.to_string(),
                }
            } else {
                ComposeError::Lookup(e)
            }
        })?;

        let abi = Arc::new(abi);
        self.abis.write().insert(code.to_string(), abi.clone());
        Ok(abi)
    }

    async fn finish(
        &self,
        messages: Vec<Message>,
        scope: BTreeSet<String>,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError> {
        let expire_in = self.config.expire_in_secs;

        if messages.is_empty() {
            debug!("empty transaction, nothing to sign or broadcast");
            let transaction = TransactionBuilder::new(TransactionHeader::local(expire_in))
                .scope(scope)
                .build();
            return Ok(ComposeResult {
                transaction_id: transaction.id(),
                transaction,
                broadcast: false,
                receipt: None,
            });
        }

        let (header, chain_id) = if options.sign || options.broadcast {
            let info = self.chain.get_info().await.map_err(ComposeError::Header)?;
            let header = TransactionHeader::from_chain_info(&info, expire_in)
                .map_err(ComposeError::Header)?;
            (header, info.chain_id_bytes())
        } else {
            (TransactionHeader::local(expire_in), Vec::new())
        };

        let mut transaction = TransactionBuilder::new(header)
            .scope(scope)
            .messages(messages)
            .build();
        let transaction_id = transaction.id();
        debug!(
            id = %transaction_id,
            messages = transaction.messages.len(),
            sign = options.sign,
            broadcast = options.broadcast,
            "transaction composed"
        );

        if options.sign {
            transaction.signatures = pipeline::sign_transaction(
                self.chain.as_ref(),
                self.key_provider.as_deref(),
                self.sign_provider.as_deref(),
                &transaction,
                &chain_id,
            )
            .await
            .map_err(|err| {
                warn!(id = %transaction_id, error = %err, "signing failed");
                err
            })?;
        }

        let receipt = if options.broadcast {
            let receipt = self
                .chain
                .push_transaction(&transaction)
                .await
                .map_err(|err| {
                    warn!(id = %transaction_id, error = %err, "broadcast failed");
                    ComposeError::Broadcast(err)
                })?;
            info!(id = %transaction_id, messages = transaction.messages.len(), "transaction broadcast");
            Some(receipt)
        } else {
            None
        };

        Ok(ComposeResult {
            transaction_id,
            transaction,
            broadcast: receipt.is_some(),
            receipt,
        })
    }
}

// ---------------------------------------------------------------------------
// ComposerBuilder
// ---------------------------------------------------------------------------

/// Fluent construction of a [`Composer`].
pub struct ComposerBuilder {
    chain: Arc<dyn ChainApi>,
    config: ComposerConfig,
    key_provider: Option<Arc<dyn KeyProvider>>,
    sign_provider: Option<Arc<dyn SignProvider>>,
    abis: HashMap<String, Arc<ContractAbi>>,
}

impl ComposerBuilder {
    pub fn config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn key_provider(mut self, provider: impl KeyProvider + 'static) -> Self {
        self.key_provider = Some(Arc::new(provider));
        self
    }

    pub fn sign_provider(mut self, provider: impl SignProvider + 'static) -> Self {
        self.sign_provider = Some(Arc::new(provider));
        self
    }

    /// Pre-register a contract ABI.
    pub fn abi(mut self, code: impl Into<String>, abi: ContractAbi) -> Self {
        self.abis.insert(code.into(), Arc::new(abi));
        self
    }

    pub fn build(self) -> Composer {
        Composer {
            chain: self.chain,
            config: self.config,
            key_provider: self.key_provider,
            sign_provider: self.sign_provider,
            abis: RwLock::new(self.abis),
            scope: Mutex::new(None),
            next_scope_id: AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_defaults_and_bool_shorthand() {
        let opts = ComposeOptions::default();
        assert!(opts.broadcast && opts.sign);

        let opts = ComposeOptions::from(false);
        assert!(!opts.broadcast);
        assert!(opts.sign);
    }

    #[test]
    fn input_from_json_reports_missing_field_by_index() {
        let value = json!({
            "scope": ["inita"],
            "messages": [
                {"code": "eos", "type": "transfer", "data": {}, "authorization": []},
                {"code": "eos", "data": {}, "authorization": []}
            ]
        });
        let err = TransactionInput::from_json(&value).unwrap_err();
        match err {
            ComposeError::InvalidMessage { index, reason } => {
                assert_eq!(index, 1);
                assert_eq!(reason, "missing type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn input_from_json_requires_messages() {
        let err = TransactionInput::from_json(&json!({"scope": []})).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidTransaction(_)));
    }

    #[test]
    fn input_from_json_accepts_hex_data() {
        let input = TransactionInput::from_json(&json!({
            "messages": [{"code": "eos", "type": "transfer", "data": "00ff", "authorization": []}]
        }))
        .unwrap();
        assert!(input.scope.is_empty());
        assert!(input.messages[0].data.is_hex());
    }

    #[test]
    fn validate_checks_authorization_entries() {
        let input = TransactionInput::from_json(&json!({
            "messages": [{
                "code": "eos", "type": "transfer", "data": {},
                "authorization": [{"account": "inita", "permission": ""}]
            }]
        }))
        .unwrap();
        assert!(matches!(
            input.validate(),
            Err(ComposeError::InvalidMessage { index: 0, .. })
        ));
    }
}
