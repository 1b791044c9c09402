//! # Native System Contract ABI
//!
//! | Action       | Fields                                                        |
//! |--------------|---------------------------------------------------------------|
//! | `transfer`   | `from`, `to` (account_name), `amount` (uint64), `memo` (string) |
//! | `newaccount` | `creator`, `name` (account_name), `owner`, `active` (public_key), `recovery` (account_name), `deposit` (asset) |
//! | `okproducer` | `voter`, `producer` (account_name), `approve` (int8)          |
//!
//! Field order is the positional argument order.

use quill_client::transaction::ActionDef;
use quill_client::{ComposerBuilder, ContractAbi};

/// Account the system contract is deployed under.
pub const SYSTEM_CONTRACT: &str = quill_client::config::SYSTEM_CONTRACT;

pub fn native_abi() -> ContractAbi {
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
            "newaccount",
            [
                ("creator", "account_name"),
                ("name", "account_name"),
                ("owner", "public_key"),
                ("active", "public_key"),
                ("recovery", "account_name"),
                ("deposit", "asset"),
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

/// Pre-register the native ABI under [`SYSTEM_CONTRACT`], so system
/// actions never fetch the ABI from the node.
pub fn with_native_abi(builder: ComposerBuilder) -> ComposerBuilder {
    builder.abi(SYSTEM_CONTRACT, native_abi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_are_listed_in_order() {
        assert_eq!(
            native_abi().action_names(),
            vec!["transfer", "newaccount", "okproducer"]
        );
    }

    #[test]
    fn newaccount_scope_covers_every_account_field() {
        let abi = native_abi();
        let def = abi.action("newaccount").unwrap();
        let data = def
            .bind(
                json!(["inita", "newbie", "EOSowner", "EOSactive", "initb", "1.0000 EOS"])
                    .into(),
            )
            .unwrap();
        assert_eq!(def.accounts(&data), vec!["inita", "newbie", "initb"]);
    }

    #[test]
    fn transfer_rejects_bad_account() {
        let abi = native_abi();
        let err = abi
            .action("transfer")
            .unwrap()
            .bind(json!(["Not.Valid", "initb", 1, ""]).into())
            .unwrap_err();
        assert!(err.to_string().contains("not a valid account name"));
    }
}
