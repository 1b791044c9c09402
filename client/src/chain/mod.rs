//! # Chain Access
//!
//! Everything the composer needs from a node goes through the [`ChainApi`]
//! trait. Two implementations ship with the crate:
//!
//! | Type            | Backing                                    |
//! |-----------------|--------------------------------------------|
//! | [`HttpChain`]   | A node's `/v1/chain/*` HTTP endpoints       |
//! | [`MemoryChain`] | In-process state, for tests and dry runs    |
//!
//! ## Endpoint Index
//!
//! | Operation            | Path                              |
//! |----------------------|-----------------------------------|
//! | `get_info`           | `/v1/chain/get_info`              |
//! | `get_block`          | `/v1/chain/get_block`             |
//! | `get_code`           | `/v1/chain/get_code`              |
//! | `get_required_keys`  | `/v1/chain/get_required_keys`     |
//! | `push_transaction`   | `/v1/chain/push_transaction`      |

pub mod api;
pub mod http;
pub mod memory;

pub use api::{Block, ChainApi, ChainError, ChainInfo, PushReceipt, RequiredKeys};
pub use http::HttpChain;
pub use memory::{CallCounts, MemoryChain};
