//! Transport-level error types.

use thiserror::Error;

use oraclescan_core::AnalysisError;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC operation.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP request failed (connection refused, reset, DNS, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Request timed out after the configured duration.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl RpcError {
    /// Returns `true` if this error is transient and worth retrying.
    ///
    /// Node-side `-320xx` server errors ("header not found", temporary
    /// execution reverts while a block range is still being resolved) count
    /// as transient; client-side protocol errors do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Rpc(err) => (-32099..=-32000).contains(&err.code),
            _ => false,
        }
    }
}

impl From<RpcError> for AnalysisError {
    fn from(err: RpcError) -> Self {
        if err.is_retryable() {
            AnalysisError::Transient(err.to_string())
        } else {
            AnalysisError::Node(err.to_string())
        }
    }
}
