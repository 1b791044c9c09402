//! Core value types carried inside a transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::MAX_ACCOUNT_NAME_LENGTH;

// ---------------------------------------------------------------------------
// Account names
// ---------------------------------------------------------------------------

/// Account names are 1–13 characters drawn from `a-z`, `1-5` and `.`, and
/// may not end with a dot.
pub fn is_valid_account_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ACCOUNT_NAME_LENGTH
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || ('1'..='5').contains(&c) || c == '.')
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// One `account@permission` pair a message claims to act under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Authorization {
    pub account: String,
    pub permission: String,
}

impl Authorization {
    pub fn new(account: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            permission: permission.into(),
        }
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account, self.permission)
    }
}

// ---------------------------------------------------------------------------
// MessageData
// ---------------------------------------------------------------------------

/// A message payload, either still structured or already serialized to hex.
///
/// On the wire a hex payload is a JSON string and a structured payload is
/// anything else (normally an object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageData {
    Hex(String),
    Structured(serde_json::Value),
}

impl MessageData {
    /// Serialize a structured payload to hex. Hex payloads pass through.
    pub fn into_hex(self) -> Self {
        match self {
            Self::Structured(value) => Self::Hex(hex::encode(canonical_json(&value))),
            hex @ Self::Hex(_) => hex,
        }
    }

    pub fn is_hex(&self) -> bool {
        matches!(self, Self::Hex(_))
    }

    /// Bytes that go into the signing buffer.
    ///
    /// A hex payload contributes its decoded bytes. A string that is not
    /// valid hex contributes its UTF-8 bytes so hashing never fails.
    pub fn payload_bytes(&self) -> Vec<u8> {
        match self {
            Self::Structured(value) => canonical_json(value),
            Self::Hex(s) => hex::decode(s).unwrap_or_else(|_| s.as_bytes().to_vec()),
        }
    }

    /// Structured payload as an object, if it is one.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self {
            Self::Structured(value) => value.as_object(),
            Self::Hex(_) => None,
        }
    }
}

impl From<serde_json::Value> for MessageData {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

fn canonical_json(value: &serde_json::Value) -> Vec<u8> {
    // Writing a `Value` into a Vec cannot fail.
    serde_json::to_vec(value).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single contract action: the atomic unit appended to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Contract account that executes the action.
    pub code: String,
    /// Action name within the contract.
    #[serde(rename = "type")]
    pub action: String,
    pub data: MessageData,
    pub authorization: Vec<Authorization>,
}

impl Message {
    pub fn new(
        code: impl Into<String>,
        action: impl Into<String>,
        data: impl Into<MessageData>,
        authorization: Vec<Authorization>,
    ) -> Self {
        Self {
            code: code.into(),
            action: action.into(),
            data: data.into(),
            authorization,
        }
    }

    /// Structural check: every field a node needs is present and non-empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() {
            return Err("missing code".to_string());
        }
        if self.action.trim().is_empty() {
            return Err("missing type".to_string());
        }
        if let MessageData::Structured(serde_json::Value::Null) = self.data {
            return Err("missing data".to_string());
        }
        for auth in &self.authorization {
            if auth.account.trim().is_empty() || auth.permission.trim().is_empty() {
                return Err(format!("incomplete authorization '{}'", auth));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_name_rules() {
        assert!(is_valid_account_name("inita"));
        assert!(is_valid_account_name("a12345"));
        assert!(is_valid_account_name("eos.token"));
        assert!(!is_valid_account_name(""));
        assert!(!is_valid_account_name("UPPER"));
        assert!(!is_valid_account_name("has6digit"));
        assert!(!is_valid_account_name("trailing."));
        assert!(!is_valid_account_name("fourteenchars1"));
    }

    #[test]
    fn message_json_uses_type_field() {
        let msg = Message::new(
            "eos",
            "transfer",
            json!({"from": "inita"}),
            vec![Authorization::new("inita", "active")],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "transfer");
        assert!(value.get("action").is_none());
    }

    #[test]
    fn string_data_deserializes_as_hex() {
        let msg: Message = serde_json::from_value(json!({
            "code": "eos",
            "type": "transfer",
            "data": "00ff",
            "authorization": []
        }))
        .unwrap();
        assert_eq!(msg.data, MessageData::Hex("00ff".to_string()));
        assert_eq!(msg.data.payload_bytes(), vec![0x00, 0xff]);
    }

    #[test]
    fn into_hex_is_stable_for_same_object() {
        let a = MessageData::from(json!({"b": 1, "a": 2})).into_hex();
        let b = MessageData::from(json!({"a": 2, "b": 1})).into_hex();
        assert_eq!(a, b);
        assert!(a.is_hex());
    }

    #[test]
    fn validate_flags_missing_pieces() {
        let mut msg = Message::new("eos", "transfer", json!({}), vec![]);
        assert!(msg.validate().is_ok());

        msg.code.clear();
        assert_eq!(msg.validate().unwrap_err(), "missing code");

        msg.code = "eos".into();
        msg.authorization.push(Authorization::new("inita", ""));
        assert!(msg.validate().unwrap_err().contains("authorization"));

        msg.authorization.clear();
        msg.data = MessageData::Structured(serde_json::Value::Null);
        assert_eq!(msg.validate().unwrap_err(), "missing data");
    }
}
