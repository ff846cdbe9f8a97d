//! Aggregate statistics over one analysis run.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use oraclescan_core::{ClassificationResult, MarketEvent};

/// Summary numbers for a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Markets observed in the scanned block range.
    pub total_markets: usize,
    /// Distinct oracle addresses classified.
    pub unique_oracles: usize,
    /// Count of oracles per protocol tag, sorted by tag.
    pub oracle_types: BTreeMap<String, usize>,
    /// Mean confidence over all classified oracles, 0.0 when none.
    pub avg_confidence: f64,
    /// RFC 3339 timestamp of report generation.
    pub generated_at: String,
}

impl AnalysisStats {
    pub fn from_results(
        markets: &[MarketEvent],
        results: &HashMap<String, ClassificationResult>,
    ) -> Self {
        let mut oracle_types = BTreeMap::new();
        let mut confidence_sum = 0.0;
        for result in results.values() {
            *oracle_types
                .entry(result.oracle_type.to_string())
                .or_insert(0) += 1;
            confidence_sum += result.confidence;
        }
        let avg_confidence = if results.is_empty() {
            0.0
        } else {
            confidence_sum / results.len() as f64
        };

        Self {
            total_markets: markets.len(),
            unique_oracles: results.len(),
            oracle_types,
            avg_confidence,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraclescan_core::OracleType;

    fn result(address: &str, tag: OracleType, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            oracle_type: tag,
            confidence,
            ..ClassificationResult::unknown(address)
        }
    }

    #[test]
    fn aggregates_counts_and_mean() {
        let mut results = HashMap::new();
        results.insert(
            "0xaa".to_string(),
            result("0xaa", OracleType::Chainlink, 0.8),
        );
        results.insert("0xbb".to_string(), result("0xbb", OracleType::Chainlink, 0.6));
        results.insert("0xcc".to_string(), result("0xcc", OracleType::Unknown, 0.0));

        let stats = AnalysisStats::from_results(&[], &results);
        assert_eq!(stats.total_markets, 0);
        assert_eq!(stats.unique_oracles, 3);
        assert_eq!(stats.oracle_types["chainlink"], 2);
        assert_eq!(stats.oracle_types["unknown"], 1);
        assert!((stats.avg_confidence - (0.8 + 0.6) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_run_has_zero_mean() {
        let stats = AnalysisStats::from_results(&[], &HashMap::new());
        assert_eq!(stats.unique_oracles, 0);
        assert_eq!(stats.avg_confidence, 0.0);
        assert!(stats.oracle_types.is_empty());
        assert!(!stats.generated_at.is_empty());
    }
}
