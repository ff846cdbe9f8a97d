//! Confidence scoring for pattern matches.
//!
//! Pure arithmetic: function-selector evidence is weighted at 60%, storage
//! evidence at 30%, factory-deployment evidence at 10%. A pattern whose
//! minimum function-match threshold is not met scores 0.0 outright, so
//! storage-fragment coincidence alone can never produce a positive match.
//!
//! Substring matching is heuristic; treat scores as approximate likelihoods,
//! not a security-grade classification.

use crate::patterns::SignaturePattern;

const FUNCTION_WEIGHT: f64 = 0.6;
const STORAGE_WEIGHT: f64 = 0.3;
const FACTORY_WEIGHT: f64 = 0.1;

/// Combine match evidence into a confidence score in `[0.0, 1.0]`.
pub fn confidence_score(
    matched_functions: usize,
    matched_storage: usize,
    pattern: &SignaturePattern,
    factory_match: bool,
) -> f64 {
    let func_confidence = ratio(matched_functions, pattern.function_patterns.len()) * FUNCTION_WEIGHT;
    let storage_confidence = ratio(matched_storage, pattern.storage_patterns.len()) * STORAGE_WEIGHT;
    let factory_confidence = if factory_match { FACTORY_WEIGHT } else { 0.0 };

    if matched_functions < pattern.required_function_matches {
        return 0.0;
    }

    (func_confidence + storage_confidence + factory_confidence).min(1.0)
}

fn ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}
