//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use quill_client::compose::{Composer, ComposerBuilder, StaticKeys};
use quill_client::crypto::PrivateKey;
use quill_client::transaction::{ActionDef, ContractAbi};
use quill_client::MemoryChain;

/// The slice of the system contract ABI the tests exercise.
pub fn system_abi() -> ContractAbi {
    ContractAbi::new(vec![
        ActionDef::new(
            "transfer",
            [
                ("from", "account_name"),
                ("to", "account_name"),
                ("amount", "uint64"),
                ("memo", "string"),
            ],
        ),
        ActionDef::new(
            "okproducer",
            [
                ("voter", "account_name"),
                ("producer", "account_name"),
                ("approve", "int8"),
            ],
        ),
    ])
}

/// A user-deployed token contract.
pub fn currency_abi() -> ContractAbi {
    ContractAbi::new(vec![
        ActionDef::new(
            "transfer",
            [
                ("from", "account_name"),
                ("to", "account_name"),
                ("quantity", "uint64"),
            ],
        ),
        ActionDef::new("issue", [("to", "account_name"), ("quantity", "uint64")]),
    ])
}

/// Two funded accounts, `inita` and `initb`, each with its own key.
pub struct Fixture {
    pub chain: Arc<MemoryChain>,
    pub inita: PrivateKey,
    pub initb: PrivateKey,
}

impl Fixture {
    pub fn new() -> Self {
        let inita = PrivateKey::from_seed(&[0xa1; 32]);
        let initb = PrivateKey::from_seed(&[0xb2; 32]);
        let chain = MemoryChain::new()
            .with_account("inita", inita.public_key())
            .with_account("initb", initb.public_key())
            .with_account("initc", PrivateKey::from_seed(&[0xc3; 32]).public_key())
            .with_contract("currency", currency_abi());
        Self {
            chain: Arc::new(chain),
            inita,
            initb,
        }
    }

    /// Builder with the system ABI registered and no providers.
    pub fn builder(&self) -> ComposerBuilder {
        Composer::builder(self.chain.clone()).abi("eos", system_abi())
    }

    /// Composer holding the keys of both accounts.
    pub fn composer(&self) -> Composer {
        self.builder()
            .key_provider(StaticKeys::new(vec![
                self.inita.to_encoded(),
                self.initb.to_encoded(),
            ]))
            .build()
    }
}
