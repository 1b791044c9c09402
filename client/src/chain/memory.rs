//! In-process [`ChainApi`] for tests, benchmarks and offline dry runs.
//!
//! `MemoryChain` keeps a head block counter, a contract table and an
//! account → public key table. It checks what a real node would check on
//! push (one valid signature per required key, in order, over the signing
//! buffer) and counts every call so tests can assert on network traffic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;

use super::api::{Block, ChainApi, ChainError, ChainInfo, PushReceipt, RequiredKeys};
use crate::crypto::{sha256, verify};
use crate::transaction::{ContractAbi, Transaction};

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_info: usize,
    pub get_block: usize,
    pub get_code: usize,
    pub get_required_keys: usize,
    pub push_transaction: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.get_info + self.get_block + self.get_code + self.get_required_keys + self.push_transaction
    }
}

struct State {
    chain_id: String,
    genesis_time: DateTime<Utc>,
    head_block_num: u32,
    contracts: HashMap<String, ContractAbi>,
    accounts: HashMap<String, String>,
    blocks: HashMap<u32, Vec<String>>,
    pushed: Vec<Transaction>,
    calls: CallCounts,
    push_failure: Option<ChainError>,
    required_keys_failure: Option<ChainError>,
}

impl State {
    fn block_time(&self, num: u32) -> DateTime<Utc> {
        self.genesis_time + Duration::seconds(i64::from(num))
    }

    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: Some(self.chain_id.clone()),
            head_block_num: self.head_block_num,
            head_block_id: MemoryChain::block_id(self.head_block_num),
            head_block_time: self.block_time(self.head_block_num),
            last_irreversible_block_num: self.head_block_num.saturating_sub(1),
        }
    }

    /// Keys of the transaction's authorizing accounts, in order, no repeats.
    fn required_keys(&self, tx: &Transaction) -> Result<Vec<String>, ChainError> {
        let mut keys: Vec<String> = Vec::new();
        for account in tx.authorizing_accounts() {
            let key = self
                .accounts
                .get(&account)
                .ok_or(ChainError::UnknownKey { key: account })?;
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }
}

/// A single-node chain held in memory.
pub struct MemoryChain {
    state: Mutex<State>,
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChain {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            state: Mutex::new(State {
                chain_id: hex::encode(sha256(b"quill-memory-chain")),
                genesis_time: DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now),
                head_block_num: 1,
                contracts: HashMap::new(),
                accounts: HashMap::new(),
                blocks: HashMap::new(),
                pushed: Vec::new(),
                calls: CallCounts::default(),
                push_failure: None,
                required_keys_failure: None,
            }),
        }
    }

    pub fn with_contract(self, code: impl Into<String>, abi: ContractAbi) -> Self {
        self.state.lock().contracts.insert(code.into(), abi);
        self
    }

    /// Register an account controlled by `public_key`.
    pub fn with_account(self, name: impl Into<String>, public_key: impl ToString) -> Self {
        self.state
            .lock()
            .accounts
            .insert(name.into(), public_key.to_string());
        self
    }

    /// Deterministic block id: `sha256(num)` with the block number in the
    /// first four bytes, as nodes lay it out.
    pub fn block_id(num: u32) -> String {
        let mut id = sha256(&num.to_be_bytes());
        id[..4].copy_from_slice(&num.to_be_bytes());
        hex::encode(id)
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    pub fn pushed(&self) -> Vec<Transaction> {
        self.state.lock().pushed.clone()
    }

    pub fn head_block_num(&self) -> u32 {
        self.state.lock().head_block_num
    }

    /// Make every following push fail with `err`.
    pub fn fail_push(&self, err: ChainError) {
        self.state.lock().push_failure = Some(err);
    }

    /// Make every following `get_required_keys` fail with `err`.
    pub fn fail_required_keys(&self, err: ChainError) {
        self.state.lock().required_keys_failure = Some(err);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.push_failure = None;
        state.required_keys_failure = None;
    }
}

fn rejected(message: impl Into<String>) -> ChainError {
    ChainError::Node {
        status: 400,
        message: message.into(),
    }
}

#[async_trait]
impl ChainApi for MemoryChain {
    async fn get_info(&self) -> Result<ChainInfo, ChainError> {
        let mut state = self.state.lock();
        state.calls.get_info += 1;
        Ok(state.info())
    }

    async fn get_block(&self, block_num: u32) -> Result<Block, ChainError> {
        let mut state = self.state.lock();
        state.calls.get_block += 1;
        if block_num == 0 || block_num > state.head_block_num {
            return Err(rejected(format!("unknown block {}", block_num)));
        }
        Ok(Block {
            block_num,
            id: Self::block_id(block_num),
            previous: Self::block_id(block_num - 1),
            timestamp: state.block_time(block_num),
            transactions: state.blocks.get(&block_num).cloned().unwrap_or_default(),
        })
    }

    async fn get_code(&self, account: &str) -> Result<ContractAbi, ChainError> {
        let mut state = self.state.lock();
        state.calls.get_code += 1;
        state
            .contracts
            .get(account)
            .cloned()
            .ok_or_else(|| ChainError::UnknownKey {
                key: account.to_string(),
            })
    }

    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[String],
    ) -> Result<RequiredKeys, ChainError> {
        let mut state = self.state.lock();
        state.calls.get_required_keys += 1;
        if let Some(err) = state.required_keys_failure.clone() {
            return Err(err);
        }

        let required = state.required_keys(transaction)?;
        if let Some(missing) = required.iter().find(|k| !available_keys.contains(*k)) {
            return Err(rejected(format!("no available key satisfies {}", missing)));
        }
        Ok(RequiredKeys {
            required_keys: required,
        })
    }

    async fn push_transaction(&self, transaction: &Transaction) -> Result<PushReceipt, ChainError> {
        let mut state = self.state.lock();
        state.calls.push_transaction += 1;
        if let Some(err) = state.push_failure.clone() {
            return Err(err);
        }

        if transaction.expiration <= state.block_time(state.head_block_num) {
            return Err(rejected("expired transaction"));
        }

        let required = state.required_keys(transaction)?;
        if transaction.signatures.len() != required.len() {
            return Err(rejected(format!(
                "expected {} signatures, got {}",
                required.len(),
                transaction.signatures.len()
            )));
        }

        let chain_id = state.info().chain_id_bytes();
        let buf = transaction.signing_buffer(&chain_id);
        for (i, (sig, key)) in transaction.signatures.iter().zip(&required).enumerate() {
            if !verify(&buf, sig, key) {
                return Err(rejected(format!("signature {} does not match {}", i, key)));
            }
        }

        let id = transaction.id();
        state.head_block_num += 1;
        let block_num = state.head_block_num;
        state.blocks.insert(block_num, vec![id.clone()]);
        state.pushed.push(transaction.clone());

        Ok(PushReceipt {
            transaction_id: id,
            processed: json!({ "block_num": block_num }),
        })
    }
}
