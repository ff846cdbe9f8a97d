//! oraclescan-core — shared data model, error taxonomy, and configuration.
//!
//! # Architecture
//!
//! ```text
//! MarketEventFetcher → Vec<MarketEvent> → distinct oracle addresses
//!                                              │
//!                                              ▼
//!                       OracleIdentifier → address → ClassificationResult
//! ```
//!
//! This crate holds the write-once records the pipeline exchanges
//! ([`MarketEvent`], [`ClassificationResult`]), the run-level error taxonomy
//! ([`AnalysisError`]), and the environment-driven [`AnalyzerConfig`].

pub mod config;
pub mod error;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use types::{
    is_valid_address, normalize_address, ClassificationResult, MarketEvent, MarketParams,
    OracleType,
};
