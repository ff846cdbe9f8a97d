//! Environment-driven configuration for an analysis run.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::is_valid_address;

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// JSON-RPC endpoint URL of the node.
    pub rpc_url: String,
    /// Address of the lending protocol contract emitting market events.
    pub contract_address: String,
    /// First block of the scan range.
    pub start_block: u64,
    /// Optional last block of the scan range. `None` = chain head at run time.
    pub end_block: Option<u64>,
    /// Blocks per `eth_getLogs` sub-range.
    pub batch_size: u64,
    /// Retries per sub-range before it is skipped.
    pub max_retries: u32,
    /// Base delay for linear retry backoff, milliseconds.
    pub base_delay_ms: u64,
    /// Courtesy delay between sub-range requests, milliseconds.
    pub request_delay_ms: u64,
    /// Directory reports are written to.
    pub output_dir: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            contract_address: String::new(),
            start_block: 0,
            end_block: None,
            batch_size: 2000,
            max_retries: 3,
            base_delay_ms: 100,
            request_delay_ms: 100,
            output_dir: "results".into(),
        }
    }
}

impl AnalyzerConfig {
    /// Build a config from environment variables.
    ///
    /// `RPC_URL` and `CONTRACT_ADDRESS` are required (checked by
    /// [`validate`](Self::validate)); the rest fall back to defaults:
    /// `START_BLOCK`, `END_BLOCK`, `BATCH_SIZE`, `MAX_RETRIES`,
    /// `BASE_DELAY_MS`, `REQUEST_DELAY_MS`, `OUTPUT_DIR`.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let defaults = Self::default();
        Ok(Self {
            rpc_url: std::env::var("RPC_URL").unwrap_or_default(),
            contract_address: std::env::var("CONTRACT_ADDRESS").unwrap_or_default(),
            start_block: env_parse("START_BLOCK", defaults.start_block)?,
            end_block: match std::env::var("END_BLOCK") {
                Ok(v) => Some(parse_var("END_BLOCK", &v)?),
                Err(_) => None,
            },
            batch_size: env_parse("BATCH_SIZE", defaults.batch_size)?,
            max_retries: env_parse("MAX_RETRIES", defaults.max_retries)?,
            base_delay_ms: env_parse("BASE_DELAY_MS", defaults.base_delay_ms)?,
            request_delay_ms: env_parse("REQUEST_DELAY_MS", defaults.request_delay_ms)?,
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(defaults.output_dir),
        })
    }

    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.rpc_url.is_empty() {
            return Err(AnalysisError::Config("RPC_URL is required".into()));
        }
        if self.contract_address.is_empty() {
            return Err(AnalysisError::Config("CONTRACT_ADDRESS is required".into()));
        }
        if !is_valid_address(&self.contract_address) {
            return Err(AnalysisError::Config(format!(
                "CONTRACT_ADDRESS is not a valid address: {}",
                self.contract_address
            )));
        }
        if self.batch_size == 0 {
            return Err(AnalysisError::Config("BATCH_SIZE must be at least 1".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AnalysisError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) => parse_var(name, &v),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, AnalysisError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AnalysisError::Config(format!("invalid {name} value {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AnalyzerConfig {
        AnalyzerConfig {
            rpc_url: "https://cloudflare-eth.com".into(),
            contract_address: "0xBBBBBbbBBb9cC5e90e3b3Af64bdAF62C37EEFFCb".into(),
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn defaults() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.batch_size, 2000);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.base_delay_ms, 100);
        assert_eq!(cfg.output_dir, "results");
        assert!(cfg.end_block.is_none());
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_url() {
        let cfg = AnalyzerConfig {
            rpc_url: String::new(),
            ..valid_config()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_address() {
        let cfg = AnalyzerConfig {
            contract_address: "0x1234".into(),
            ..valid_config()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let cfg = AnalyzerConfig {
            batch_size: 0,
            ..valid_config()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn parse_var_reports_name_and_value() {
        let err = parse_var::<u64>("BATCH_SIZE", "abc").unwrap_err();
        assert!(err.to_string().contains("BATCH_SIZE"));
        assert!(err.to_string().contains("abc"));
    }
}
