//! oraclescan-report — analysis artifacts on disk.
//!
//! Turns a run's market events and classification results into CSV and JSON
//! files plus a logged summary. Pure data-out; no RPC access.

pub mod stats;
pub mod writer;

pub use stats::AnalysisStats;
pub use writer::{log_summary, ReportWriter};
