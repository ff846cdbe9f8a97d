//! Shared types for the market-fetch and oracle-classification pipeline.

use serde::{Deserialize, Serialize};

// ─── Addresses ────────────────────────────────────────────────────────────────

/// Returns `true` if `address` is a `0x`-prefixed 20-byte hex address.
pub fn is_valid_address(address: &str) -> bool {
    let hex = match address.strip_prefix("0x") {
        Some(h) => h,
        None => return false,
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Canonical (lowercase) form of an address for use as a map key.
pub fn normalize_address(address: &str) -> String {
    address.to_ascii_lowercase()
}

// ─── MarketParams ─────────────────────────────────────────────────────────────

/// The five creation parameters of a lending market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Address of the loan token.
    pub loan_token: String,
    /// Address of the collateral token.
    pub collateral_token: String,
    /// Address of the price oracle contract.
    pub oracle: String,
    /// Address of the interest rate model.
    pub irm: String,
    /// Liquidation loan-to-value, scaled by a fixed denominator.
    /// Treated as an opaque integer here.
    pub lltv: u128,
}

// ─── MarketEvent ──────────────────────────────────────────────────────────────

/// A single market-creation event observed on chain.
///
/// Created exactly once when the fetch pipeline processes the corresponding
/// log; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// 32-byte market identifier (`0x…`), unique per market.
    pub id: String,
    /// The market's creation parameters.
    pub params: MarketParams,
    /// Block number the event was emitted in.
    pub block_number: u64,
    /// Hash of the transaction that created the market.
    pub transaction_hash: String,
    /// Unix timestamp of the containing block, when resolvable.
    pub timestamp: Option<i64>,
}

// ─── OracleType ───────────────────────────────────────────────────────────────

/// Supported oracle protocol tags. A closed set, not open-ended extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleType {
    Chainlink,
    Tellor,
    Redstone,
    Uniswap,
    Pyth,
    Api3,
    Band,
    Dia,
    Unknown,
}

impl OracleType {
    /// Stable lowercase tag used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chainlink => "chainlink",
            Self::Tellor => "tellor",
            Self::Redstone => "redstone",
            Self::Uniswap => "uniswap",
            Self::Pyth => "pyth",
            Self::Api3 => "api3",
            Self::Band => "band",
            Self::Dia => "dia",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a tag string; anything unrecognized maps to `Unknown`.
    pub fn from_tag(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "chainlink" => Self::Chainlink,
            "tellor" => Self::Tellor,
            "redstone" => Self::Redstone,
            "uniswap" => Self::Uniswap,
            "pyth" => Self::Pyth,
            "api3" => Self::Api3,
            "band" => Self::Band,
            "dia" => Self::Dia,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for OracleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── ClassificationResult ─────────────────────────────────────────────────────

/// Outcome of classifying one oracle address.
///
/// Produced once per distinct address per analysis run; write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Best-matching protocol tag, or `Unknown`.
    pub oracle_type: OracleType,
    /// The classified address (canonical lowercase).
    pub address: String,
    /// Heuristic confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Selector fragments of the winning pattern found in the bytecode.
    pub matched_functions: Vec<String>,
    /// Storage fragments of the winning pattern found in the bytecode.
    pub matched_storage: Vec<String>,
    /// Whether the contract's deployer is a known factory for the winning
    /// pattern. `None` when no pattern won.
    pub factory_match: Option<bool>,
    /// Failure message, for results produced from a classification error.
    pub error: Option<String>,
}

impl ClassificationResult {
    /// An `Unknown` result with zero confidence and no match evidence.
    pub fn unknown(address: &str) -> Self {
        Self {
            oracle_type: OracleType::Unknown,
            address: normalize_address(address),
            confidence: 0.0,
            matched_functions: vec![],
            matched_storage: vec![],
            factory_match: None,
            error: None,
        }
    }

    /// An `Unknown` result carrying an error message.
    pub fn unknown_with_error(address: &str, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::unknown(address)
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
