//! oraclescan-rpc — JSON-RPC transport and typed Ethereum client.
//!
//! # Architecture
//!
//! ```text
//! EthRpcClient (capability trait)
//!       │
//!   EthClient<T: RpcTransport>   (typed eth_* methods)
//!       │
//!   HttpRpcClient               (reqwest, one send per request)
//! ```
//!
//! Retry lives in [`retry`] as a policy object; the fetch pipeline applies it
//! per sub-range rather than per HTTP request.

pub mod error;
pub mod eth;
pub mod http;
pub mod request;
pub mod retry;
pub mod transport;

pub use error::RpcError;
pub use eth::{BlockHeader, BlockTag, EthClient, EthRpcClient, LogFilter, RawLog, TxReceipt};
pub use http::{HttpClientConfig, HttpRpcClient};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::RpcTransport;
