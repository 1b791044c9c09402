//! Typed native actions.
//!
//! Each struct mirrors one action of [`native_abi`](crate::native_abi) and
//! converts into named [`ActionArgs`], so it goes through the same binding
//! and type checks as an untyped call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use quill_client::{
    ActionArgs, ComposeError, ComposeOptions, ComposeResult, Composer, TransactionHandle,
};

/// An action with a fixed name on the system contract.
pub trait NativeAction {
    const NAME: &'static str;

    fn args(&self) -> ActionArgs;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub memo: String,
}

impl Transfer {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            memo: String::new(),
        }
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

impl NativeAction for Transfer {
    const NAME: &'static str = "transfer";

    fn args(&self) -> ActionArgs {
        named(json!({
            "from": self.from,
            "to": self.to,
            "amount": self.amount,
            "memo": self.memo,
        }))
    }
}

/// Create `name`, paid for by `creator`. Keys are `EOS...` public keys and
/// `deposit` is an asset string such as `"1.0000 EOS"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub creator: String,
    pub name: String,
    pub owner: String,
    pub active: String,
    pub recovery: String,
    pub deposit: String,
}

impl NativeAction for NewAccount {
    const NAME: &'static str = "newaccount";

    fn args(&self) -> ActionArgs {
        named(json!({
            "creator": self.creator,
            "name": self.name,
            "owner": self.owner,
            "active": self.active,
            "recovery": self.recovery,
            "deposit": self.deposit,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkProducer {
    pub voter: String,
    pub producer: String,
    pub approve: i8,
}

impl OkProducer {
    pub fn new(voter: impl Into<String>, producer: impl Into<String>, approve: bool) -> Self {
        Self {
            voter: voter.into(),
            producer: producer.into(),
            approve: i8::from(approve),
        }
    }
}

impl NativeAction for OkProducer {
    const NAME: &'static str = "okproducer";

    fn args(&self) -> ActionArgs {
        named(json!({
            "voter": self.voter,
            "producer": self.producer,
            "approve": self.approve,
        }))
    }
}

fn named(value: Value) -> ActionArgs {
    ActionArgs::from(value)
}

// ---------------------------------------------------------------------------
// Builder-side helpers
// ---------------------------------------------------------------------------

/// Typed appends on a [`TransactionHandle`].
///
/// The handle must be bound to a contract whose ABI has the action, which
/// is the case for handles from `Composer::transaction`.
pub trait NativeActions {
    fn native<A: NativeAction>(&self, action: &A) -> Result<(), ComposeError>;

    fn transfer(&self, transfer: Transfer) -> Result<(), ComposeError> {
        self.native(&transfer)
    }

    fn newaccount(&self, account: NewAccount) -> Result<(), ComposeError> {
        self.native(&account)
    }

    fn okproducer(&self, vote: OkProducer) -> Result<(), ComposeError> {
        self.native(&vote)
    }
}

impl NativeActions for TransactionHandle {
    fn native<A: NativeAction>(&self, action: &A) -> Result<(), ComposeError> {
        self.action(A::NAME, action.args())
    }
}

// ---------------------------------------------------------------------------
// Single-message shorthands
// ---------------------------------------------------------------------------

/// Send one native action as its own transaction.
#[async_trait]
pub trait NativeContract {
    async fn transfer(
        &self,
        transfer: Transfer,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError>;

    async fn newaccount(
        &self,
        account: NewAccount,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError>;

    async fn okproducer(
        &self,
        vote: OkProducer,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError>;
}

#[async_trait]
impl NativeContract for Composer {
    async fn transfer(
        &self,
        transfer: Transfer,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError> {
        self.action(Transfer::NAME, transfer.args(), options).await
    }

    async fn newaccount(
        &self,
        account: NewAccount,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError> {
        self.action(NewAccount::NAME, account.args(), options).await
    }

    async fn okproducer(
        &self,
        vote: OkProducer,
        options: ComposeOptions,
    ) -> Result<ComposeResult, ComposeError> {
        self.action(OkProducer::NAME, vote.args(), options).await
    }
}
