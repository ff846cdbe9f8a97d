//! The `RpcTransport` trait — the abstraction over the node connection.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RpcError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// The async trait every RPC transport must implement.
///
/// The transport sends each request exactly once; the retry budget for
/// transient failures belongs to the fetch pipeline, which retries whole
/// sub-ranges with linear backoff.
///
/// Implementations must be `Send + Sync`; the trait is object-safe apart
/// from the generic `call` helper.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send a single JSON-RPC request and return the response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError>;

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;

    /// Convenience: call a method and deserialize the result.
    async fn call<T: DeserializeOwned>(
        &self,
        id: u64,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let req = JsonRpcRequest::new(id, method, params);
        let resp = self.send(req).await?;
        let result = resp.into_result().map_err(RpcError::Rpc)?;
        serde_json::from_value(result).map_err(RpcError::Deserialization)
    }
}
