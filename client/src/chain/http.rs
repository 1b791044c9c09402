//! [`ChainApi`] over a node's HTTP chain API.
//!
//! Every operation is a JSON `POST` to `{endpoint}/v1/chain/{operation}`.
//! Nodes report failures as
//!
//! ```json
//! {"code": 500, "message": "...", "error": {"name": "...", "what": "..."}}
//! ```
//!
//! and any body whose `what` or `message` mentions `unknown key` becomes
//! [`ChainError::UnknownKey`]. No retries: a failed call is reported once.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::api::{Block, ChainApi, ChainError, ChainInfo, PushReceipt, RequiredKeys};
use crate::config::{ClientConfig, CHAIN_API_PATH, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::transaction::{ContractAbi, Transaction};

const UNKNOWN_KEY_MARKER: &str = "unknown key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GetBlockRequest {
    block_num_or_id: u32,
}

#[derive(Serialize)]
struct GetCodeRequest<'a> {
    account_name: &'a str,
}

#[derive(Deserialize)]
struct GetCodeResponse {
    #[serde(default)]
    abi: Option<ContractAbi>,
}

#[derive(Serialize)]
struct GetRequiredKeysRequest<'a> {
    transaction: &'a Transaction,
    available_keys: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct NodeErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: Option<NodeErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeErrorDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    what: String,
}

// ---------------------------------------------------------------------------
// HttpChain
// ---------------------------------------------------------------------------

/// HTTP client for one node.
#[derive(Debug, Clone)]
pub struct HttpChain {
    client: Client,
    base_url: String,
}

impl HttpChain {
    /// Client for `endpoint` with the default request timeout.
    pub fn new(endpoint: &str) -> Result<Self, ChainError> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: format!("{}{}", endpoint.trim_end_matches('/'), CHAIN_API_PATH),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ChainError> {
        Self::with_timeout(
            &config.endpoint,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Full URL of the chain API, e.g. `http://127.0.0.1:8888/v1/chain`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, ChainError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, operation);
        debug!(%url, "chain request");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = node_error(status.as_u16(), &text);
            warn!(operation, status = status.as_u16(), error = %err, "chain request failed");
            return Err(err);
        }

        serde_json::from_str(&text)
            .map_err(|e| ChainError::Decode(format!("{} response: {}", operation, e)))
    }
}

fn node_error(status: u16, text: &str) -> ChainError {
    let body: NodeErrorBody = serde_json::from_str(text).unwrap_or_default();
    let detail = body.error.unwrap_or_default();

    if detail.what.contains(UNKNOWN_KEY_MARKER) || body.message.contains(UNKNOWN_KEY_MARKER) {
        return ChainError::UnknownKey { key: detail.name };
    }

    let message = [detail.what, body.message]
        .into_iter()
        .find(|m| !m.is_empty())
        .unwrap_or_else(|| text.trim().to_string());
    ChainError::Node { status, message }
}

#[async_trait]
impl ChainApi for HttpChain {
    async fn get_info(&self) -> Result<ChainInfo, ChainError> {
        self.post("get_info", &serde_json::json!({})).await
    }

    async fn get_block(&self, block_num: u32) -> Result<Block, ChainError> {
        self.post(
            "get_block",
            &GetBlockRequest {
                block_num_or_id: block_num,
            },
        )
        .await
    }

    async fn get_code(&self, account: &str) -> Result<ContractAbi, ChainError> {
        let resp: GetCodeResponse = self
            .post(
                "get_code",
                &GetCodeRequest {
                    account_name: account,
                },
            )
            .await?;
        resp.abi.ok_or_else(|| ChainError::UnknownKey {
            key: account.to_string(),
        })
    }

    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[String],
    ) -> Result<RequiredKeys, ChainError> {
        self.post(
            "get_required_keys",
            &GetRequiredKeysRequest {
                transaction,
                available_keys,
            },
        )
        .await
    }

    async fn push_transaction(&self, transaction: &Transaction) -> Result<PushReceipt, ChainError> {
        self.post("push_transaction", transaction).await
    }
}
