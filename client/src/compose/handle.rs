//! The builder-facing side of a composition scope.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::error::ComposeError;
use crate::config::ComposerConfig;
use crate::transaction::{ActionArgs, Authorization, ContractAbi, Message};

/// An appended entry. Actions on a contract whose ABI was not cached when
/// the composition opened wait in `Unbound` until the composer fetches it.
enum Entry {
    Bound(Message),
    Unbound {
        action: String,
        args: ActionArgs,
        authorization: Vec<Authorization>,
    },
}

#[derive(Default)]
struct Pending {
    entries: Vec<Entry>,
    scope: BTreeSet<String>,
    closed: bool,
}

struct HandleInner {
    code: String,
    abi: Option<Arc<ContractAbi>>,
    default_permission: String,
    force_hex: bool,
    pending: Mutex<Pending>,
}

/// Appends messages to the transaction being composed.
///
/// A handle is bound to one contract and accepts any action in that
/// contract's ABI. Appending never suspends. Once the builder returns, the
/// handle is closed and further appends fail with
/// [`ComposeError::ScopeClosed`].
///
/// When the contract's ABI is already known, `action` checks its arguments
/// on the spot. Otherwise the action is recorded as given and checked once
/// the builder has returned, so the ABI is only fetched by compositions that
/// actually use it.
#[derive(Clone)]
pub struct TransactionHandle {
    inner: Arc<HandleInner>,
}

impl TransactionHandle {
    pub(crate) fn new(
        code: String,
        abi: Option<Arc<ContractAbi>>,
        config: &ComposerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                code,
                abi,
                default_permission: config.default_permission.clone(),
                force_hex: config.force_message_data_hex,
                pending: Mutex::new(Pending::default()),
            }),
        }
    }

    /// Contract the handle is bound to.
    pub fn code(&self) -> &str {
        &self.inner.code
    }

    /// The bound contract's ABI, if it was known when the composition
    /// opened.
    pub fn abi(&self) -> Option<&ContractAbi> {
        self.inner.abi.as_deref()
    }

    /// Append `name` with the default authorization: the first
    /// `account_name` field of the payload, at the default permission.
    pub fn action(&self, name: &str, args: impl Into<ActionArgs>) -> Result<(), ComposeError> {
        self.action_as(name, args, Vec::new())
    }

    /// Append `name` with an explicit authorization list. An empty list
    /// falls back to the default authorization.
    pub fn action_as(
        &self,
        name: &str,
        args: impl Into<ActionArgs>,
        authorization: Vec<Authorization>,
    ) -> Result<(), ComposeError> {
        match &self.inner.abi {
            Some(abi) => {
                let (message, accounts) = bind_action(
                    &self.inner.code,
                    abi,
                    &self.inner.default_permission,
                    name,
                    args.into(),
                    authorization,
                )?;
                self.append(message, accounts)
            }
            None => self.push(
                Entry::Unbound {
                    action: name.to_string(),
                    args: args.into(),
                    authorization,
                },
                Vec::new(),
            ),
        }
    }

    /// Append a fully specified message, for any contract.
    pub fn message(&self, message: Message) -> Result<(), ComposeError> {
        message
            .validate()
            .map_err(|reason| ComposeError::InvalidMessage {
                index: self.len(),
                reason,
            })?;
        self.append(message, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.inner.pending.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append(&self, mut message: Message, accounts: Vec<String>) -> Result<(), ComposeError> {
        if self.inner.force_hex {
            message.data = message.data.into_hex();
        }
        self.push(Entry::Bound(message), accounts)
    }

    fn push(&self, entry: Entry, accounts: Vec<String>) -> Result<(), ComposeError> {
        let mut pending = self.inner.pending.lock();
        if pending.closed {
            return Err(ComposeError::ScopeClosed);
        }
        pending.scope.extend(accounts);
        pending.entries.push(entry);
        Ok(())
    }

    /// End the composition and take what was appended.
    pub(crate) fn close(&self) -> Draft {
        let mut pending = self.inner.pending.lock();
        pending.closed = true;
        Draft {
            code: self.inner.code.clone(),
            default_permission: self.inner.default_permission.clone(),
            force_hex: self.inner.force_hex,
            entries: std::mem::take(&mut pending.entries),
            scope: std::mem::take(&mut pending.scope),
        }
    }
}

/// What a closed handle held.
pub(crate) struct Draft {
    code: String,
    default_permission: String,
    force_hex: bool,
    entries: Vec<Entry>,
    scope: BTreeSet<String>,
}

impl Draft {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any action still has to be checked against the ABI.
    pub(crate) fn needs_abi(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, Entry::Unbound { .. }))
    }

    /// Bind the remaining actions against `abi`, keeping append order.
    pub(crate) fn bind(
        self,
        abi: Option<&ContractAbi>,
    ) -> Result<(Vec<Message>, BTreeSet<String>), ComposeError> {
        let Draft {
            code,
            default_permission,
            force_hex,
            entries,
            mut scope,
        } = self;

        let mut messages = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Entry::Bound(message) => messages.push(message),
                Entry::Unbound {
                    action,
                    args,
                    authorization,
                } => {
                    let abi = abi.ok_or_else(|| ComposeError::UnknownContract {
                        code: code.clone(),
                    })?;
                    let (mut message, accounts) = bind_action(
                        &code,
                        abi,
                        &default_permission,
                        &action,
                        args,
                        authorization,
                    )?;
                    if force_hex {
                        message.data = message.data.into_hex();
                    }
                    scope.extend(accounts);
                    messages.push(message);
                }
            }
        }
        Ok((messages, scope))
    }
}

fn bind_action(
    code: &str,
    abi: &ContractAbi,
    default_permission: &str,
    name: &str,
    args: ActionArgs,
    authorization: Vec<Authorization>,
) -> Result<(Message, Vec<String>), ComposeError> {
    let def = abi
        .action(name)
        .ok_or_else(|| ComposeError::UnknownAction {
            code: code.to_string(),
            action: name.to_string(),
        })?;
    let data = def.bind(args)?;
    let accounts = def.accounts(&data);

    let authorization = if authorization.is_empty() {
        accounts
            .first()
            .map(|account| vec![Authorization::new(account.clone(), default_permission)])
            .unwrap_or_default()
    } else {
        authorization
    };

    let message = Message::new(code, name, Value::Object(data), authorization);
    Ok((message, accounts))
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("code", &self.inner.code)
            .field("messages", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{ActionDef, MessageData};
    use serde_json::json;

    fn test_abi() -> ContractAbi {
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
            ActionDef::new("ping", [("note", "string")]),
        ])
    }

    fn config(force_hex: bool) -> ComposerConfig {
        ComposerConfig {
            force_message_data_hex: force_hex,
            ..ComposerConfig::default()
        }
    }

    fn handle(force_hex: bool) -> TransactionHandle {
        TransactionHandle::new("eos".into(), Some(Arc::new(test_abi())), &config(force_hex))
    }

    fn unbound_handle(force_hex: bool) -> TransactionHandle {
        TransactionHandle::new("eos".into(), None, &config(force_hex))
    }

    fn drain(tr: &TransactionHandle) -> (Vec<Message>, BTreeSet<String>) {
        tr.close().bind(None).unwrap()
    }

    #[test]
    fn default_authorization_is_first_account_field() {
        let tr = handle(false);
        tr.action("transfer", json!(["initb", "inita", 1, ""])).unwrap();
        let (messages, scope) = drain(&tr);
        assert_eq!(
            messages[0].authorization,
            vec![Authorization::new("initb", "active")]
        );
        assert_eq!(scope.into_iter().collect::<Vec<_>>(), vec!["inita", "initb"]);
    }

    #[test]
    fn explicit_authorization_wins() {
        let tr = handle(false);
        tr.action_as(
            "transfer",
            json!(["inita", "initb", 1, ""]),
            vec![Authorization::new("inita", "owner")],
        )
        .unwrap();
        let (messages, _) = drain(&tr);
        assert_eq!(messages[0].authorization[0].permission, "owner");
    }

    #[test]
    fn actions_without_accounts_have_no_authorization() {
        let tr = handle(false);
        tr.action("ping", json!({"note": "hi"})).unwrap();
        let (messages, scope) = drain(&tr);
        assert!(messages[0].authorization.is_empty());
        assert!(scope.is_empty());
    }

    #[test]
    fn unknown_action_rejected() {
        let err = handle(false).action("mint", json!([])).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::UnknownAction { ref action, .. } if action == "mint"
        ));
    }

    #[test]
    fn bad_arguments_rejected_without_appending() {
        let tr = handle(false);
        let err = tr.action("transfer", json!(["inita"])).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidArguments(_)));
        assert!(tr.is_empty());
    }

    #[test]
    fn force_hex_converts_payloads() {
        let tr = handle(true);
        tr.action("transfer", json!(["inita", "initb", 1, ""])).unwrap();
        let (messages, _) = drain(&tr);
        assert!(messages[0].data.is_hex());
    }

    #[test]
    fn message_validated_with_index() {
        let tr = handle(false);
        tr.action("ping", json!(["a"])).unwrap();
        let err = tr
            .message(Message::new("", "x", json!({}), vec![]))
            .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidMessage { index: 1, .. }));
    }

    #[test]
    fn closed_handle_rejects_appends() {
        let tr = handle(false);
        let clone = tr.clone();
        tr.action("ping", json!(["a"])).unwrap();
        let (messages, _) = drain(&tr);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            clone.action("ping", json!(["b"])),
            Err(ComposeError::ScopeClosed)
        ));
    }

    #[test]
    fn hex_message_data_passes_through() {
        let tr = handle(false);
        tr.message(Message::new(
            "other",
            "raw",
            MessageData::Hex("00ff".into()),
            vec![Authorization::new("inita", "active")],
        ))
        .unwrap();
        assert_eq!(tr.len(), 1);
    }

    #[test]
    fn actions_without_abi_bind_after_close_in_order() {
        let tr = unbound_handle(false);
        tr.action("ping", json!(["first"])).unwrap();
        tr.message(Message::new("other", "raw", json!({"x": 1}), vec![]))
            .unwrap();
        tr.action("transfer", json!(["initb", "inita", 1, ""])).unwrap();

        let draft = tr.close();
        assert!(draft.needs_abi());
        assert_eq!(draft.len(), 3);

        let abi = test_abi();
        let (messages, scope) = draft.bind(Some(&abi)).unwrap();
        let actions: Vec<_> = messages.iter().map(|m| m.action.as_str()).collect();
        assert_eq!(actions, vec!["ping", "raw", "transfer"]);
        assert_eq!(
            messages[2].authorization,
            vec![Authorization::new("initb", "active")]
        );
        assert_eq!(scope.into_iter().collect::<Vec<_>>(), vec!["inita", "initb"]);
    }

    #[test]
    fn messages_alone_never_need_an_abi() {
        let tr = unbound_handle(false);
        tr.message(Message::new("other", "raw", json!({}), vec![]))
            .unwrap();
        let draft = tr.close();
        assert!(!draft.needs_abi());
        assert_eq!(draft.bind(None).unwrap().0.len(), 1);
    }

    #[test]
    fn unbound_actions_are_checked_at_bind() {
        let abi = test_abi();

        let tr = unbound_handle(false);
        tr.action("mint", json!([])).unwrap();
        assert!(matches!(
            tr.close().bind(Some(&abi)),
            Err(ComposeError::UnknownAction { .. })
        ));

        let tr = unbound_handle(false);
        tr.action("transfer", json!(["inita"])).unwrap();
        assert!(matches!(
            tr.close().bind(Some(&abi)),
            Err(ComposeError::InvalidArguments(_))
        ));

        let tr = unbound_handle(false);
        tr.action("ping", json!(["a"])).unwrap();
        assert!(matches!(
            tr.close().bind(None),
            Err(ComposeError::UnknownContract { .. })
        ));
    }

    #[test]
    fn force_hex_applies_to_late_bound_actions() {
        let abi = test_abi();
        let tr = unbound_handle(true);
        tr.action("ping", json!(["a"])).unwrap();
        let (messages, _) = tr.close().bind(Some(&abi)).unwrap();
        assert!(messages[0].data.is_hex());
    }
}
