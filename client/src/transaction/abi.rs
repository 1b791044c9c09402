//! Contract ABIs and argument binding.
//!
//! An ABI is an explicit table of actions, each with an ordered field list.
//! Callers pass arguments either positionally (mapped onto field order) or
//! as a named object; [`ActionDef::bind`] turns both into the same payload
//! object and applies light type checks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::is_valid_account_name;

/// ABI type of fields that hold account names. Such fields join the
/// transaction scope, and the first one supplies the default authorization.
pub const ACCOUNT_NAME_TYPE: &str = "account_name";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("{action}: expected {expected} arguments, got {got}")]
    Arity {
        action: String,
        expected: usize,
        got: usize,
    },

    #[error("{action}: missing field '{field}'")]
    MissingField { action: String, field: String },

    #[error("{action}: unexpected field '{field}'")]
    UnexpectedField { action: String, field: String },

    #[error("{action}: field '{field}' {reason}")]
    InvalidField {
        action: String,
        field: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ABI tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// The action table of one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbi {
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl ContractAbi {
    pub fn new(actions: Vec<ActionDef>) -> Self {
        Self { actions }
    }

    pub fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }
}

impl ActionDef {
    /// Build a definition from `(field, type)` pairs.
    pub fn new<'a>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef {
                    name: name.to_string(),
                    type_name: ty.to_string(),
                })
                .collect(),
        }
    }

    /// Map arguments onto this action's fields and type-check them.
    pub fn bind(&self, args: ActionArgs) -> Result<Map<String, Value>, AbiError> {
        let data = match args {
            ActionArgs::Positional(values) => {
                if values.len() != self.fields.len() {
                    return Err(AbiError::Arity {
                        action: self.name.clone(),
                        expected: self.fields.len(),
                        got: values.len(),
                    });
                }
                self.fields
                    .iter()
                    .map(|f| f.name.clone())
                    .zip(values)
                    .collect::<Map<String, Value>>()
            }
            ActionArgs::Named(map) => {
                if let Some(extra) = map.keys().find(|k| !self.fields.iter().any(|f| &f.name == *k))
                {
                    return Err(AbiError::UnexpectedField {
                        action: self.name.clone(),
                        field: extra.clone(),
                    });
                }
                if let Some(missing) = self.fields.iter().find(|f| !map.contains_key(&f.name)) {
                    return Err(AbiError::MissingField {
                        action: self.name.clone(),
                        field: missing.name.clone(),
                    });
                }
                map
            }
        };

        for field in &self.fields {
            if let Some(value) = data.get(&field.name) {
                check_type(&field.type_name, value).map_err(|reason| AbiError::InvalidField {
                    action: self.name.clone(),
                    field: field.name.clone(),
                    reason,
                })?;
            }
        }

        Ok(data)
    }

    /// Values of every `account_name` field in `data`, in field order.
    pub fn accounts(&self, data: &Map<String, Value>) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.type_name == ACCOUNT_NAME_TYPE)
            .filter_map(|f| data.get(&f.name).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

fn check_type(type_name: &str, value: &Value) -> Result<(), String> {
    match type_name {
        ACCOUNT_NAME_TYPE => match value.as_str() {
            Some(name) if is_valid_account_name(name) => Ok(()),
            Some(name) => Err(format!("'{}' is not a valid account name", name)),
            None => Err("must be an account name string".to_string()),
        },
        "string" => value
            .is_string()
            .then_some(())
            .ok_or_else(|| "must be a string".to_string()),
        "bool" => value
            .is_boolean()
            .then_some(())
            .ok_or_else(|| "must be a bool".to_string()),
        t if t.starts_with("uint") => match as_integer(value) {
            Some(n) if n >= 0 => Ok(()),
            Some(_) => Err("must not be negative".to_string()),
            None => Err("must be an integer".to_string()),
        },
        t if t.starts_with("int") => as_integer(value)
            .map(|_| ())
            .ok_or_else(|| "must be an integer".to_string()),
        // Compound types (asset, public_key, ...) are the node's to check.
        _ => Ok(()),
    }
}

// Integers may arrive as JSON numbers or as decimal strings (large u64
// amounts are often quoted).
fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ActionArgs
// ---------------------------------------------------------------------------

/// Arguments to an ABI-driven action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionArgs {
    /// Values in ABI field order.
    Positional(Vec<Value>),
    /// Values keyed by field name.
    Named(Map<String, Value>),
}

impl From<Vec<Value>> for ActionArgs {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<Map<String, Value>> for ActionArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self::Named(map)
    }
}

/// Arrays are positional and objects are named. Any other value is a
/// single positional argument.
impl From<Value> for ActionArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::Positional(values),
            Value::Object(map) => Self::Named(map),
            other => Self::Positional(vec![other]),
        }
    }
}
