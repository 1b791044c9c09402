//! # Client Configuration & Constants
//!
//! Every default the client relies on lives here, next to the
//! [`ClientConfig`] that a TOML file can override.
//!
//! ```toml
//! endpoint = "http://127.0.0.1:8888"
//! request_timeout_secs = 10
//!
//! [composer]
//! system_contract = "eos"
//! default_permission = "active"
//! expire_in_secs = 60
//! force_message_data_hex = false
//!
//! [log]
//! level = "info"
//! format = "pretty"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::transaction::types::is_valid_account_name;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Node HTTP endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8888";

/// Path prefix of the chain API on the node.
pub const CHAIN_API_PATH: &str = "/v1/chain";

/// Per-request timeout for the HTTP transport. The composer itself never
/// times anything out.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Seconds between the reference block time and transaction expiration.
pub const DEFAULT_EXPIRE_IN_SECS: u32 = 60;

/// Upper bound for `expire_in_secs`. Nodes refuse anything further out.
pub const MAX_EXPIRE_IN_SECS: u32 = 3_600;

/// The native contract whose actions a plain `transaction` builder exposes.
pub const SYSTEM_CONTRACT: &str = "eos";

/// Permission attached to ABI-driven actions when the caller gives none.
pub const DEFAULT_PERMISSION: &str = "active";

/// Prefix of public key strings.
pub const PUBLIC_KEY_PREFIX: &str = "EOS";

/// Longest legal account name.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 13;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// ComposerConfig
// ---------------------------------------------------------------------------

/// Settings that shape how the composer builds transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Contract bound to `Composer::transaction` builders.
    pub system_contract: String,
    /// Permission used for default authorizations.
    pub default_permission: String,
    /// Expiration offset from the reference block time.
    pub expire_in_secs: u32,
    /// Convert structured payloads to hex before they enter a transaction.
    pub force_message_data_hex: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            system_contract: SYSTEM_CONTRACT.to_string(),
            default_permission: DEFAULT_PERMISSION.to_string(),
            expire_in_secs: DEFAULT_EXPIRE_IN_SECS,
            force_message_data_hex: false,
        }
    }
}

impl ComposerConfig {
    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_account_name(&self.system_contract) {
            return Err(ConfigError::Invalid(format!(
                "system_contract '{}' is not a valid account name",
                self.system_contract
            )));
        }
        if self.default_permission.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_permission must not be empty".to_string(),
            ));
        }
        if self.expire_in_secs == 0 || self.expire_in_secs > MAX_EXPIRE_IN_SECS {
            return Err(ConfigError::Invalid(format!(
                "expire_in_secs must be within 1..={}, got {}",
                MAX_EXPIRE_IN_SECS, self.expire_in_secs
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogConfig
// ---------------------------------------------------------------------------

/// Logging settings consumed by binaries. The library only emits `tracing`
/// events; installing a subscriber is the binary's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Top-level client configuration. All fields have defaults, so an empty
/// file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the node, without the `/v1/chain` suffix.
    pub endpoint: String,
    /// HTTP request timeout.
    pub request_timeout_secs: u64,
    pub composer: ComposerConfig,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            composer: ComposerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint '{}' must be an http(s) URL",
                self.endpoint
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        self.composer.validate()
    }
}
