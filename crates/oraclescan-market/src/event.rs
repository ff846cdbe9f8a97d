//! CreateMarket event decoding.
//!
//! The market-creation event carries the market id as an indexed topic and
//! the five-field params tuple ABI-encoded in the log data:
//!
//! ```text
//! CreateMarket(bytes32 indexed id,
//!              (address loanToken, address collateralToken,
//!               address oracle, address irm, uint256 lltv) marketParams)
//! ```
//!
//! The tuple has no dynamic fields, so the data is exactly five 32-byte
//! words encoded inline.

use tiny_keccak::{Hasher, Keccak};

use oraclescan_core::{AnalysisError, MarketEvent, MarketParams};
use oraclescan_rpc::RawLog;

/// Canonical ABI signature of the market-creation event.
pub const CREATE_MARKET_SIGNATURE: &str =
    "CreateMarket(bytes32,(address,address,address,address,uint256))";

/// Canonical ABI signature of the params point-lookup function.
pub const ID_TO_MARKET_PARAMS_SIGNATURE: &str = "idToMarketParams(bytes32)";

const WORD_HEX_LEN: usize = 64;

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Compute the `topics[0]` value of an event from its canonical signature.
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

/// Compute the 4-byte call selector of a function from its canonical signature.
pub fn function_selector(signature: &str) -> String {
    format!("0x{}", hex::encode(&keccak256(signature.as_bytes())[..4]))
}

/// Slice the `i`-th 32-byte word out of `0x`-stripped data hex.
fn word(data: &str, i: usize) -> Result<&str, AnalysisError> {
    let start = i * WORD_HEX_LEN;
    let end = start + WORD_HEX_LEN;
    data.get(start..end).ok_or_else(|| {
        AnalysisError::Decode(format!(
            "data too short: expected word {i} at hex offset {start}"
        ))
    })
}

/// Decode an address from an ABI word (last 20 of 32 bytes).
fn address_from_word(w: &str) -> String {
    format!("0x{}", w[WORD_HEX_LEN - 40..].to_ascii_lowercase())
}

/// Decode an unsigned integer from an ABI word.
///
/// The value is kept as u128; a word with any of the high 128 bits set is
/// rejected rather than truncated.
fn u128_from_word(w: &str) -> Result<u128, AnalysisError> {
    let (high, low) = w.split_at(WORD_HEX_LEN / 2);
    if high.bytes().any(|b| b != b'0') {
        return Err(AnalysisError::Decode(format!(
            "integer word overflows u128: 0x{w}"
        )));
    }
    u128::from_str_radix(low, 16)
        .map_err(|e| AnalysisError::Decode(format!("invalid integer word 0x{w}: {e}")))
}

/// Decode the five-word market params tuple from event data or `eth_call`
/// return data (`0x`-prefixed hex).
pub fn decode_market_params(data: &str) -> Result<MarketParams, AnalysisError> {
    let hex_data = data.strip_prefix("0x").unwrap_or(data);
    Ok(MarketParams {
        loan_token: address_from_word(word(hex_data, 0)?),
        collateral_token: address_from_word(word(hex_data, 1)?),
        oracle: address_from_word(word(hex_data, 2)?),
        irm: address_from_word(word(hex_data, 3)?),
        lltv: u128_from_word(word(hex_data, 4)?)?,
    })
}

/// Materialize a [`MarketEvent`] from a raw CreateMarket log and its block
/// timestamp.
pub fn decode_create_market(
    log: &RawLog,
    timestamp: Option<i64>,
) -> Result<MarketEvent, AnalysisError> {
    let id = log
        .topics
        .get(1)
        .ok_or_else(|| AnalysisError::Decode("missing indexed market id topic".into()))?;

    Ok(MarketEvent {
        id: id.to_ascii_lowercase(),
        params: decode_market_params(&log.data)?,
        block_number: log.block_number_u64(),
        transaction_hash: log.tx_hash.clone(),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 5 inline words: loan, collateral, oracle, irm, lltv = 0x42.
    fn sample_data() -> String {
        let mut data = String::from("0x");
        for fill in ["11", "22", "33", "44"] {
            data.push_str(&"0".repeat(24));
            data.push_str(&fill.repeat(20));
        }
        data.push_str(&"0".repeat(62));
        data.push_str("42");
        data
    }

    fn sample_log() -> RawLog {
        RawLog {
            address: "0xbbbbbbbbbb9cc5e90e3b3af64bdaf62c37eeffcb".into(),
            topics: vec![
                event_topic(CREATE_MARKET_SIGNATURE),
                format!("0x{}", "ab".repeat(32)),
            ],
            data: sample_data(),
            block_number: "0x121eac0".into(),
            tx_hash: "0xfeed".into(),
            log_index: "0x0".into(),
        }
    }

    #[test]
    fn erc20_transfer_topic() {
        // Well-known hash, pins the keccak plumbing.
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn erc20_transfer_selector() {
        assert_eq!(function_selector("transfer(address,uint256)"), "0xa9059cbb");
    }

    #[test]
    fn decode_params_words() {
        let params = decode_market_params(&sample_data()).unwrap();
        assert_eq!(params.loan_token, format!("0x{}", "11".repeat(20)));
        assert_eq!(params.collateral_token, format!("0x{}", "22".repeat(20)));
        assert_eq!(params.oracle, format!("0x{}", "33".repeat(20)));
        assert_eq!(params.irm, format!("0x{}", "44".repeat(20)));
        assert_eq!(params.lltv, 0x42);
    }

    #[test]
    fn decode_params_rejects_short_data() {
        let err = decode_market_params("0x1234").unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn decode_params_rejects_lltv_overflow() {
        let mut data = sample_data();
        // Set the high half of the lltv word.
        let lltv_start = 2 + 4 * 64;
        data.replace_range(lltv_start..lltv_start + 2, "ff");
        let err = decode_market_params(&data).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn decode_event_from_log() {
        let event = decode_create_market(&sample_log(), Some(1_700_000_000)).unwrap();
        assert_eq!(event.id, format!("0x{}", "ab".repeat(32)));
        assert_eq!(event.block_number, 19_000_000);
        assert_eq!(event.transaction_hash, "0xfeed");
        assert_eq!(event.timestamp, Some(1_700_000_000));
        assert_eq!(event.params.oracle, format!("0x{}", "33".repeat(20)));
    }

    #[test]
    fn decode_event_requires_id_topic() {
        let mut log = sample_log();
        log.topics.truncate(1);
        let err = decode_create_market(&log, None).unwrap_err();
        assert!(err.to_string().contains("market id"));
    }
}
