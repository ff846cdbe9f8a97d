//! Error taxonomy for the analysis pipeline.

use thiserror::Error;

/// Errors that can occur during an analysis run.
///
/// Failures local to one unit of work (one sub-range, one address) are
/// contained at that unit's boundary by the components that own them; only
/// structurally invalid input or unrecoverable setup failure is fatal to a
/// whole run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Caller supplied `start > end`. Fatal to the fetch call, never retried.
    #[error("invalid block range: start {start} > end {end}")]
    InvalidRange { start: u64, end: u64 },

    /// Caller supplied a zero batch size. Fatal to the fetch call.
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// The node temporarily could not serve a request. Retried with bounded
    /// linear backoff; exhausting retries drops the owning sub-range.
    #[error("transient fetch error: {0}")]
    Transient(String),

    /// Non-transient node-side failure (bad request, execution error).
    #[error("node error: {0}")]
    Node(String),

    /// Malformed log or return data.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid environment configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Report writing failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Shorthand for a transient error from any displayable source.
    pub fn transient(err: impl std::fmt::Display) -> Self {
        Self::Transient(err.to_string())
    }

    /// Shorthand for a decode error from any displayable source.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Returns `true` if the error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
