//! `HttpChain` against an in-process axum node.
//!
//! The mock node serves the five chain endpoints on an ephemeral port and
//! records what it was sent.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use quill_client::chain::{ChainApi, ChainError, HttpChain};
use quill_client::compose::{ComposeError, Composer, StaticKeys};
use quill_client::crypto::PrivateKey;
use quill_client::transaction::{Transaction, TransactionBuilder, TransactionHeader};

// ---------------------------------------------------------------------------
// Mock node
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct NodeState {
    pushed: Arc<Mutex<Vec<Value>>>,
    reject_push: bool,
    slow_info: bool,
}

const HEAD_BLOCK_ID: &str = "0000000a01020304aabbccdd0000000000000000000000000000000000000000";

async fn get_info(State(state): State<NodeState>) -> Json<Value> {
    if state.slow_info {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    Json(json!({
        "chain_id": "cf057bbfb72640471fd910bcb67639c22df9f92470936cddc1ade0e2f2e7dc4f",
        "head_block_num": 10,
        "head_block_id": HEAD_BLOCK_ID,
        "head_block_time": "2030-01-01T00:00:00Z",
        "last_irreversible_block_num": 9
    }))
}

async fn get_block(Json(body): Json<Value>) -> Response {
    match body["block_num_or_id"].as_u64() {
        Some(10) => Json(json!({
            "block_num": 10,
            "id": HEAD_BLOCK_ID,
            "previous": "00",
            "timestamp": "2030-01-01T00:00:00Z",
            "transactions": []
        }))
        .into_response(),
        _ => node_error(StatusCode::BAD_REQUEST, "block_not_found", "Could not find block"),
    }
}

async fn get_code(Json(body): Json<Value>) -> Response {
    match body["account_name"].as_str() {
        Some("eos") => Json(json!({
            "account_name": "eos",
            "abi": serde_json::to_value(common::system_abi()).unwrap()
        }))
        .into_response(),
        Some("noabi") => Json(json!({"account_name": "noabi", "abi": null})).into_response(),
        _ => node_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unknown_account",
            "unknown key (eos::types::name): nosuch",
        ),
    }
}

async fn get_required_keys(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "required_keys": body["available_keys"].clone() }))
}

async fn push_transaction(State(state): State<NodeState>, Json(body): Json<Value>) -> Response {
    if state.reject_push {
        return node_error(StatusCode::BAD_REQUEST, "tx_expired", "expired transaction");
    }
    state.pushed.lock().push(body);
    Json(json!({
        "transaction_id": "feedface",
        "processed": {"block_num": 11}
    }))
    .into_response()
}

fn node_error(status: StatusCode, name: &str, what: &str) -> Response {
    (
        status,
        Json(json!({
            "code": status.as_u16(),
            "message": status.canonical_reason().unwrap_or("error"),
            "error": {"name": name, "what": what}
        })),
    )
        .into_response()
}

async fn spawn_node(state: NodeState) -> SocketAddr {
    let app = Router::new()
        .route("/v1/chain/get_info", post(get_info))
        .route("/v1/chain/get_block", post(get_block))
        .route("/v1/chain/get_code", post(get_code))
        .route("/v1/chain/get_required_keys", post(get_required_keys))
        .route("/v1/chain/push_transaction", post(push_transaction))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

fn empty_tx() -> Transaction {
    TransactionBuilder::new(TransactionHeader::local(60)).build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_info_and_block() {
    let addr = spawn_node(NodeState::default()).await;
    let chain = HttpChain::new(&endpoint(addr)).unwrap();

    let info = chain.get_info().await.unwrap();
    assert_eq!(info.head_block_num, 10);
    assert_eq!(info.chain_id_bytes().len(), 32);

    let header = TransactionHeader::from_chain_info(&info, 30).unwrap();
    assert_eq!(header.ref_block_num, 10);
    assert_eq!(header.ref_block_prefix, u32::from_le_bytes([0xaa, 0xbb, 0xcc, 0xdd]));

    let block = chain.get_block(10).await.unwrap();
    assert_eq!(block.id, HEAD_BLOCK_ID);
}

#[tokio::test]
async fn node_errors_are_classified() {
    let addr = spawn_node(NodeState::default()).await;
    let chain = HttpChain::new(&endpoint(addr)).unwrap();

    let err = chain.get_block(99).await.unwrap_err();
    assert_eq!(
        err,
        ChainError::Node {
            status: 400,
            message: "Could not find block".into()
        }
    );

    let err = chain.get_code("nosuch").await.unwrap_err();
    assert!(err.is_unknown_key());
    assert_eq!(err.to_string(), "unknown key");

    let err = chain.get_code("noabi").await.unwrap_err();
    assert_eq!(
        err,
        ChainError::UnknownKey {
            key: "noabi".into()
        }
    );
}

#[tokio::test]
async fn get_code_decodes_abi() {
    let addr = spawn_node(NodeState::default()).await;
    let chain = HttpChain::new(&endpoint(addr)).unwrap();

    let abi = chain.get_code("eos").await.unwrap();
    assert_eq!(abi, common::system_abi());
}

#[tokio::test]
async fn required_keys_round_trip() {
    let addr = spawn_node(NodeState::default()).await;
    let chain = HttpChain::new(&endpoint(addr)).unwrap();

    let keys = vec!["EOSkey1".to_string(), "EOSkey2".to_string()];
    let required = chain.get_required_keys(&empty_tx(), &keys).await.unwrap();
    assert_eq!(required.required_keys, keys);
}

#[tokio::test]
async fn unreachable_node_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let chain = HttpChain::new(&endpoint(addr)).unwrap();
    assert!(matches!(
        chain.get_info().await,
        Err(ChainError::Transport(_))
    ));
}

#[tokio::test]
async fn request_timeout_applies() {
    let addr = spawn_node(NodeState {
        slow_info: true,
        ..NodeState::default()
    })
    .await;
    let chain = HttpChain::with_timeout(&endpoint(addr), Duration::from_millis(100)).unwrap();

    let started = std::time::Instant::now();
    let err = chain.get_info().await.unwrap_err();
    assert!(matches!(err, ChainError::Transport(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn composer_over_http_signs_and_pushes() {
    let state = NodeState::default();
    let addr = spawn_node(state.clone()).await;
    let key = PrivateKey::from_seed(&[0x42; 32]);

    let composer = Composer::builder(Arc::new(HttpChain::new(&endpoint(addr)).unwrap()))
        .key_provider(StaticKeys::new(key.to_encoded()))
        .build();

    let result = composer
        .action("transfer", json!(["inita", "initb", 7, "over http"]), true)
        .await
        .unwrap();

    assert!(result.broadcast);
    assert_eq!(result.receipt.unwrap().transaction_id, "feedface");
    assert_eq!(result.transaction.ref_block_num, 10);

    let pushed = state.pushed.lock().clone();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0]["messages"][0]["type"], "transfer");
    assert_eq!(
        pushed[0]["signatures"][0],
        Value::String(result.transaction.signatures[0].clone())
    );
}

#[tokio::test]
async fn rejected_push_is_broadcast_error() {
    let state = NodeState {
        reject_push: true,
        ..NodeState::default()
    };
    let addr = spawn_node(state).await;
    let key = PrivateKey::from_seed(&[0x42; 32]);

    let composer = Composer::builder(Arc::new(HttpChain::new(&endpoint(addr)).unwrap()))
        .key_provider(StaticKeys::new(key.to_encoded()))
        .build();

    let err = composer
        .action("transfer", json!(["inita", "initb", 7, ""]), true)
        .await
        .unwrap_err();
    match err {
        ComposeError::Broadcast(ChainError::Node { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "expired transaction");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
