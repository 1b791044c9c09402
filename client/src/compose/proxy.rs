//! Contract-bound view of a [`Composer`].

use std::future::Future;
use std::sync::Arc;

use super::composer::{ComposeOptions, ComposeResult, Composer};
use super::error::ComposeError;
use super::handle::TransactionHandle;
use crate::transaction::{ActionArgs, ContractAbi};

/// Exposes one contract's actions, as listed in its ABI.
///
/// Obtained from [`Composer::contract`]. Calling an action the ABI does not
/// list is an [`ComposeError::UnknownAction`], never a panic.
pub struct ContractProxy<'a> {
    composer: &'a Composer,
    code: String,
    abi: Arc<ContractAbi>,
}

impl<'a> ContractProxy<'a> {
    pub(crate) fn new(composer: &'a Composer, code: String, abi: Arc<ContractAbi>) -> Self {
        Self {
            composer,
            code,
            abi,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    /// Action names in ABI order.
    pub fn actions(&self) -> Vec<&str> {
        self.abi.action_names()
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.abi.action(name).is_some()
    }

    /// Send a single action to this contract.
    pub async fn call(
        &self,
        name: &str,
        args: impl Into<ActionArgs>,
        options: impl Into<ComposeOptions>,
    ) -> Result<ComposeResult, ComposeError> {
        if !self.has_action(name) {
            return Err(ComposeError::UnknownAction {
                code: self.code.clone(),
                action: name.to_string(),
            });
        }
        self.composer
            .single_action(
                self.code.clone(),
                Some(self.abi.clone()),
                name,
                args.into(),
                options.into(),
            )
            .await
    }

    /// Compose several of this contract's actions into one transaction.
    pub async fn transaction<F, Fut>(
        &self,
        build: F,
        options: impl Into<ComposeOptions>,
    ) -> Result<ComposeResult, ComposeError>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.composer
            .compose_bound(
                self.code.clone(),
                Some(self.abi.clone()),
                build,
                options.into(),
            )
            .await
    }
}

impl std::fmt::Debug for ContractProxy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractProxy")
            .field("code", &self.code)
            .field("actions", &self.actions())
            .finish()
    }
}
