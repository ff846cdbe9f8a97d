//! Typed Ethereum JSON-RPC client.
//!
//! Wraps an [`RpcTransport`] with the capability set the analysis pipeline
//! consumes: `eth_getCode`, `eth_getLogs`, `eth_getBlockByNumber`,
//! `eth_getTransactionReceipt`, and `eth_call`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::RpcError;
use crate::transport::RpcTransport;

// ─── Wire types ───────────────────────────────────────────────────────────────

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
}

impl RawLog {
    /// Returns the block number as u64.
    pub fn block_number_u64(&self) -> u64 {
        parse_hex_u64(&self.block_number)
    }

    /// Returns the log index as u32.
    pub fn log_index_u32(&self) -> u32 {
        parse_hex_u64(&self.log_index) as u32
    }
}

/// A block header plus its transaction hashes, from `eth_getBlockByNumber`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: String,
    pub hash: String,
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<String>,
}

impl BlockHeader {
    pub fn number_u64(&self) -> u64 {
        parse_hex_u64(&self.number)
    }

    /// Unix timestamp of the block (seconds since epoch).
    pub fn timestamp_i64(&self) -> i64 {
        parse_hex_u64(&self.timestamp) as i64
    }
}

/// A transaction receipt, from `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    pub from: String,
    pub to: Option<String>,
    /// Address of the contract created by this transaction, if any.
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,
}

/// Filter for one `eth_getLogs` query.
#[derive(Debug, Clone)]
pub struct LogFilter {
    /// Contract address logs must originate from.
    pub address: String,
    /// Required `topics[0]` value (the event signature hash).
    pub topic0: String,
    /// Start block (inclusive).
    pub from_block: u64,
    /// End block (inclusive).
    pub to_block: u64,
}

/// Block height selector for state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl BlockTag {
    fn to_param(self) -> Value {
        match self {
            Self::Latest => json!("latest"),
            Self::Number(n) => json!(to_hex_u64(n)),
        }
    }
}

// ─── Hex helpers ──────────────────────────────────────────────────────────────

/// Parse a hex-encoded string (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> u64 {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).unwrap_or(0)
}

/// Format a u64 as a minimal `0x`-prefixed hex quantity.
pub fn to_hex_u64(n: u64) -> String {
    format!("0x{n:x}")
}

// ─── Client trait ─────────────────────────────────────────────────────────────

/// The node capability set consumed by the analysis pipeline.
///
/// Treated as a stateless capability safe for concurrent reads; every method
/// may fail transiently.
#[async_trait]
pub trait EthRpcClient: Send + Sync {
    /// Current chain head block number.
    async fn get_block_number(&self) -> Result<u64, RpcError>;

    /// Deployed bytecode at `address` (hex; `"0x"` when no code).
    async fn get_code(&self, address: &str, block: BlockTag) -> Result<String, RpcError>;

    /// Logs matching `filter`, in node order (ascending block, then log index).
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError>;

    /// Header (with transaction hashes) of block `number`, if it exists.
    async fn get_block(&self, number: u64) -> Result<Option<BlockHeader>, RpcError>;

    /// Receipt of transaction `tx_hash`, if known to the node.
    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, RpcError>;

    /// `eth_call` against `to` with calldata `data`; returns the return data hex.
    async fn call(&self, to: &str, data: &str) -> Result<String, RpcError>;
}

/// Typed Ethereum client over any [`RpcTransport`].
pub struct EthClient<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: RpcTransport> EthClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// The underlying endpoint URL.
    pub fn url(&self) -> &str {
        self.transport.url()
    }

    fn id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl<T: RpcTransport> EthRpcClient for EthClient<T> {
    async fn get_block_number(&self) -> Result<u64, RpcError> {
        let hex: String = self
            .transport
            .call(self.id(), "eth_blockNumber", vec![])
            .await?;
        Ok(parse_hex_u64(&hex))
    }

    async fn get_code(&self, address: &str, block: BlockTag) -> Result<String, RpcError> {
        self.transport
            .call(
                self.id(),
                "eth_getCode",
                vec![json!(address), block.to_param()],
            )
            .await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        let params = json!({
            "address": filter.address,
            "topics": [filter.topic0],
            "fromBlock": to_hex_u64(filter.from_block),
            "toBlock": to_hex_u64(filter.to_block),
        });
        self.transport
            .call(self.id(), "eth_getLogs", vec![params])
            .await
    }

    async fn get_block(&self, number: u64) -> Result<Option<BlockHeader>, RpcError> {
        // `false`: transaction hashes only, not full transaction objects.
        self.transport
            .call(
                self.id(),
                "eth_getBlockByNumber",
                vec![json!(to_hex_u64(number)), json!(false)],
            )
            .await
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, RpcError> {
        self.transport
            .call(self.id(), "eth_getTransactionReceipt", vec![json!(tx_hash)])
            .await
    }

    async fn call(&self, to: &str, data: &str) -> Result<String, RpcError> {
        let params = json!({ "to": to, "data": data });
        self.transport
            .call(self.id(), "eth_call", vec![params, json!("latest")])
            .await
    }
}
