//! CSV and JSON report files.
//!
//! Three artifacts per run, written under one output directory:
//!
//! * `markets.csv`: one row per market event, joined with its oracle's
//!   classification.
//! * `oracles.csv`: one row per distinct oracle address.
//! * `stats.json`:  run-level aggregates.
//!
//! Rows are emitted in a deterministic order (markets by block then log
//! position as fetched, oracles by address) so successive runs over the same
//! range diff cleanly.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use oraclescan_core::{normalize_address, AnalysisError, ClassificationResult, MarketEvent};

use crate::stats::AnalysisStats;

const MARKETS_HEADER: &str =
    "id,oracle,oracle_type,confidence,loan_token,collateral_token,irm,lltv,block_number,tx_hash";
const ORACLES_HEADER: &str = "address,oracle_type,confidence,error";

/// Writes analysis artifacts into an output directory.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write all three artifacts and return their paths.
    pub fn write_all(
        &self,
        markets: &[MarketEvent],
        results: &HashMap<String, ClassificationResult>,
    ) -> Result<Vec<PathBuf>, AnalysisError> {
        let stats = AnalysisStats::from_results(markets, results);
        Ok(vec![
            self.write_markets(markets, results)?,
            self.write_oracles(results)?,
            self.write_stats(&stats)?,
        ])
    }

    /// `markets.csv`: one row per event, with the oracle classification
    /// joined in. Oracles without a result are reported as `unknown` with
    /// zero confidence rather than dropped.
    pub fn write_markets(
        &self,
        markets: &[MarketEvent],
        results: &HashMap<String, ClassificationResult>,
    ) -> Result<PathBuf, AnalysisError> {
        let mut lines = vec![MARKETS_HEADER.to_string()];
        for event in markets {
            let oracle = normalize_address(&event.params.oracle);
            let (oracle_type, confidence) = match results.get(&oracle) {
                Some(r) => (r.oracle_type.as_str(), r.confidence),
                None => ("unknown", 0.0),
            };
            lines.push(
                [
                    csv_field(&event.id),
                    csv_field(&oracle),
                    oracle_type.to_string(),
                    format_confidence(confidence),
                    csv_field(&event.params.loan_token),
                    csv_field(&event.params.collateral_token),
                    csv_field(&event.params.irm),
                    event.params.lltv.to_string(),
                    event.block_number.to_string(),
                    csv_field(&event.transaction_hash),
                ]
                .join(","),
            );
        }
        self.write_file("markets.csv", &lines.join("\n"))
    }

    /// `oracles.csv`: one row per distinct address, sorted by address.
    pub fn write_oracles(
        &self,
        results: &HashMap<String, ClassificationResult>,
    ) -> Result<PathBuf, AnalysisError> {
        let sorted: BTreeMap<&String, &ClassificationResult> = results.iter().collect();
        let mut lines = vec![ORACLES_HEADER.to_string()];
        for (address, result) in sorted {
            lines.push(
                [
                    csv_field(address),
                    result.oracle_type.to_string(),
                    format_confidence(result.confidence),
                    csv_field(result.error.as_deref().unwrap_or("")),
                ]
                .join(","),
            );
        }
        self.write_file("oracles.csv", &lines.join("\n"))
    }

    /// `stats.json`: pretty-printed run aggregates.
    pub fn write_stats(&self, stats: &AnalysisStats) -> Result<PathBuf, AnalysisError> {
        let json = serde_json::to_string_pretty(stats)
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;
        self.write_file("stats.json", &json)
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf, AnalysisError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(name);
        fs::write(&path, contents)?;
        tracing::info!(path = %path.display(), "wrote report file");
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Log a human-readable run summary at info level.
pub fn log_summary(stats: &AnalysisStats) {
    tracing::info!(
        total_markets = stats.total_markets,
        unique_oracles = stats.unique_oracles,
        avg_confidence = format!("{:.3}", stats.avg_confidence).as_str(),
        "analysis complete"
    );
    for (tag, count) in &stats.oracle_types {
        tracing::info!(oracle_type = tag.as_str(), count, "protocol breakdown");
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_confidence(confidence: f64) -> String {
    format!("{confidence:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraclescan_core::{MarketParams, OracleType};

    fn event(id: &str, oracle: &str, block: u64) -> MarketEvent {
        MarketEvent {
            id: id.to_string(),
            params: MarketParams {
                loan_token: "0x1111111111111111111111111111111111111111".into(),
                collateral_token: "0x2222222222222222222222222222222222222222".into(),
                oracle: oracle.to_string(),
                irm: "0x3333333333333333333333333333333333333333".into(),
                lltv: 860_000_000_000_000_000,
            },
            block_number: block,
            transaction_hash: format!("0xtx{block}"),
            timestamp: Some(1_700_000_000),
        }
    }

    fn chainlink_result(address: &str) -> ClassificationResult {
        ClassificationResult {
            oracle_type: OracleType::Chainlink,
            confidence: 0.46,
            matched_functions: vec!["63feaf968c".into()],
            ..ClassificationResult::unknown(address)
        }
    }

    #[test]
    fn markets_csv_joins_classification() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let oracle = "0x00000000000000000000000000000000000000aa";
        let markets = vec![event("0xid1", oracle, 100), event("0xid2", "0xBB", 101)];
        let mut results = HashMap::new();
        results.insert(oracle.to_string(), chainlink_result(oracle));

        let path = writer.write_markets(&markets, &results).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], MARKETS_HEADER);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("chainlink,0.4600"));
        // No result for 0xbb: reported as unknown, not dropped.
        assert!(lines[2].starts_with("0xid2,0xbb,unknown,0.0000"));
    }

    #[test]
    fn oracles_csv_is_sorted_and_carries_errors() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let mut results = HashMap::new();
        results.insert(
            "0xbb".to_string(),
            ClassificationResult::unknown_with_error("0xbb", "no contract code"),
        );
        results.insert("0xaa".to_string(), chainlink_result("0xaa"));

        let path = writer.write_oracles(&results).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], ORACLES_HEADER);
        assert_eq!(lines[1], "0xaa,chainlink,0.4600,");
        assert_eq!(lines[2], "0xbb,unknown,0.0000,no contract code");
    }

    #[test]
    fn stats_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());

        let markets = vec![event("0xid1", "0xaa", 100)];
        let mut results = HashMap::new();
        results.insert("0xaa".to_string(), chainlink_result("0xaa"));

        let stats = AnalysisStats::from_results(&markets, &results);
        let path = writer.write_stats(&stats).unwrap();
        let parsed: AnalysisStats =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(parsed.total_markets, 1);
        assert_eq!(parsed.unique_oracles, 1);
        assert_eq!(parsed.oracle_types["chainlink"], 1);
    }

    #[test]
    fn write_all_produces_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("nested/results"));
        let paths = writer.write_all(&[], &HashMap::new()).unwrap();
        assert_eq!(paths.len(), 3);
        for path in paths {
            assert!(path.exists());
        }
    }

    #[test]
    fn csv_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
