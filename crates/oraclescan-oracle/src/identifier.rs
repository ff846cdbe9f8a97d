//! The oracle classification engine.
//!
//! For one address: fetch the deployed bytecode once, score it against every
//! catalog pattern, and keep the strictly-highest-confidence match. Any
//! failure along the way folds into an `Unknown` result; classifying one
//! address must never abort the batch analysis of the others.

use std::collections::HashMap;

use oraclescan_core::{normalize_address, AnalysisError, ClassificationResult};
use oraclescan_rpc::{BlockTag, EthRpcClient, RpcError};

use crate::patterns::SignatureCatalog;
use crate::scorer::confidence_score;

/// Classifies oracle contracts by bytecode signature matching.
pub struct OracleIdentifier<C> {
    client: C,
    catalog: SignatureCatalog,
}

impl<C: EthRpcClient> OracleIdentifier<C> {
    /// Create an identifier with the built-in protocol catalog.
    pub fn new(client: C) -> Self {
        Self::with_catalog(client, SignatureCatalog::builtin())
    }

    /// Create an identifier with a custom catalog.
    pub fn with_catalog(client: C, catalog: SignatureCatalog) -> Self {
        Self { client, catalog }
    }

    /// Classify one address. Deterministic given the address's current
    /// bytecode; never returns an error.
    pub async fn identify(&self, address: &str) -> ClassificationResult {
        match self.identify_inner(address).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(address, error = %e, "classification failed");
                ClassificationResult::unknown_with_error(address, e.to_string())
            }
        }
    }

    /// Classify each distinct address exactly once.
    ///
    /// Addresses are keyed case-insensitively; repeats reuse the first
    /// result rather than re-deriving it.
    pub async fn identify_all<I, S>(&self, addresses: I) -> HashMap<String, ClassificationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = HashMap::new();
        for address in addresses {
            let key = normalize_address(address.as_ref());
            if results.contains_key(&key) {
                continue;
            }
            let result = self.identify(address.as_ref()).await;
            results.insert(key, result);
        }
        results
    }

    async fn identify_inner(&self, address: &str) -> Result<ClassificationResult, AnalysisError> {
        let code = self.client.get_code(address, BlockTag::Latest).await?;
        let bytecode = code.strip_prefix("0x").unwrap_or(&code).to_ascii_lowercase();
        if bytecode.is_empty() {
            return Ok(ClassificationResult::unknown_with_error(
                address,
                "no contract code",
            ));
        }

        // One best-effort deployer lookup per address, shared by every
        // pattern's factory check. Skipped when no pattern could use it.
        let deployer = if self.catalog.has_factory_evidence() {
            self.deployer_of(address).await
        } else {
            None
        };

        let mut best: Option<ClassificationResult> = None;
        let mut highest = 0.0f64;

        for (oracle_type, pattern) in self.catalog.iter() {
            let matched_functions: Vec<String> = pattern
                .function_patterns
                .iter()
                .filter(|p| bytecode.contains(p.as_str()))
                .cloned()
                .collect();
            let matched_storage: Vec<String> = pattern
                .storage_patterns
                .iter()
                .filter(|p| bytecode.contains(p.as_str()))
                .cloned()
                .collect();
            let factory_match = deployer
                .as_deref()
                .map(|d| pattern.is_factory(d))
                .unwrap_or(false);

            let confidence = confidence_score(
                matched_functions.len(),
                matched_storage.len(),
                pattern,
                factory_match,
            );

            // Strictly-greater keeps the first winner on ties.
            if confidence > highest {
                highest = confidence;
                best = Some(ClassificationResult {
                    oracle_type: *oracle_type,
                    address: normalize_address(address),
                    confidence,
                    matched_functions,
                    matched_storage,
                    factory_match: Some(factory_match),
                    error: None,
                });
            }
        }

        Ok(best.unwrap_or_else(|| ClassificationResult::unknown(address)))
    }

    /// Best-effort deployer address of `address`, via its creation
    /// transaction: binary-search the first block where the address has
    /// code, then find the receipt in that block that created it.
    ///
    /// Assumes the code history is monotone (no self-destructed redeploys).
    /// Any failure degrades to `None`; factory evidence is never fatal.
    async fn deployer_of(&self, address: &str) -> Option<String> {
        match self.find_deployer(address).await {
            Ok(deployer) => deployer,
            Err(e) => {
                tracing::debug!(address, error = %e, "deployer lookup failed");
                None
            }
        }
    }

    async fn find_deployer(&self, address: &str) -> Result<Option<String>, RpcError> {
        let head = self.client.get_block_number().await?;

        let mut lo = 0u64;
        let mut hi = head;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let code = self.client.get_code(address, BlockTag::Number(mid)).await?;
            if code.trim_start_matches("0x").is_empty() {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        let block = match self.client.get_block(lo).await? {
            Some(block) => block,
            None => return Ok(None),
        };

        for tx_hash in &block.transactions {
            let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                Some(receipt) => receipt,
                None => continue,
            };
            let created = receipt
                .contract_address
                .as_deref()
                .map(|a| a.eq_ignore_ascii_case(address))
                .unwrap_or(false);
            if created {
                return Ok(Some(normalize_address(&receipt.from)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use oraclescan_core::OracleType;
    use oraclescan_rpc::{BlockHeader, LogFilter, RawLog, TxReceipt};

    const ORACLE: &str = "0x00000000000000000000000000000000000000AA";
    const CHAINLINK_DEPLOYER: &str = "0x47fb2585d2c56fe188d0e6ec628a38b74fceeedf";

    // Three selectors unique to the Chainlink pattern (threshold is 3).
    fn chainlink_bytecode() -> String {
        format!("0x6080604052{}{}{}00", "63feaf968c", "6350d25bcd", "63668a0f02")
    }

    #[derive(Default)]
    struct MockNode {
        code: String,
        /// First block at which the address has code; `None` = always.
        creation_block: Option<u64>,
        head: u64,
        block_txs: HashMap<u64, Vec<String>>,
        receipts: HashMap<String, TxReceipt>,
        code_calls: AtomicU32,
        fail_get_code: bool,
    }

    #[async_trait]
    impl EthRpcClient for MockNode {
        async fn get_block_number(&self) -> Result<u64, RpcError> {
            Ok(self.head)
        }

        async fn get_code(&self, _address: &str, block: BlockTag) -> Result<String, RpcError> {
            self.code_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_get_code {
                return Err(RpcError::Http("connection reset".into()));
            }
            let present = match (block, self.creation_block) {
                (BlockTag::Latest, _) => true,
                (BlockTag::Number(n), Some(creation)) => n >= creation,
                (BlockTag::Number(_), None) => true,
            };
            Ok(if present { self.code.clone() } else { "0x".into() })
        }

        async fn get_logs(&self, _filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
            Ok(vec![])
        }

        async fn get_block(&self, number: u64) -> Result<Option<BlockHeader>, RpcError> {
            Ok(Some(BlockHeader {
                number: format!("0x{number:x}"),
                hash: "0xblock".into(),
                timestamp: "0x0".into(),
                transactions: self.block_txs.get(&number).cloned().unwrap_or_default(),
            }))
        }

        async fn get_transaction_receipt(
            &self,
            tx_hash: &str,
        ) -> Result<Option<TxReceipt>, RpcError> {
            Ok(self.receipts.get(tx_hash).cloned())
        }

        async fn call(&self, _to: &str, _data: &str) -> Result<String, RpcError> {
            Ok("0x".into())
        }
    }

    fn deployed_node(code: String, deployer: &str) -> MockNode {
        let mut node = MockNode {
            code,
            creation_block: Some(5),
            head: 10,
            ..Default::default()
        };
        node.block_txs
            .insert(5, vec!["0xt1".into(), "0xt2".into()]);
        node.receipts.insert(
            "0xt1".into(),
            TxReceipt {
                tx_hash: "0xt1".into(),
                from: "0xelse".into(),
                to: Some("0xother".into()),
                contract_address: None,
            },
        );
        node.receipts.insert(
            "0xt2".into(),
            TxReceipt {
                tx_hash: "0xt2".into(),
                from: deployer.into(),
                to: None,
                contract_address: Some(ORACLE.into()),
            },
        );
        node
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn empty_code_short_circuits() {
        let node = MockNode {
            code: "0x".into(),
            ..Default::default()
        };
        let identifier = OracleIdentifier::new(node);
        let result = identifier.identify(ORACLE).await;

        assert_eq!(result.oracle_type, OracleType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.error.as_deref(), Some("no contract code"));
        assert!(result.matched_functions.is_empty());
        // Exactly the one bytecode fetch; no pattern or deployer work.
        assert_eq!(identifier.client.code_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn classifies_chainlink_bytecode() {
        let node = deployed_node(chainlink_bytecode(), "0xnobody");
        let identifier = OracleIdentifier::new(node);
        let result = identifier.identify(ORACLE).await;

        assert_eq!(result.oracle_type, OracleType::Chainlink);
        assert_eq!(result.matched_functions.len(), 3);
        assert_eq!(result.factory_match, Some(false));
        // 3 of 7 selectors, no storage, no factory: 0.6 * 3/7.
        assert!(close(result.confidence, 0.6 * 3.0 / 7.0));
        assert_eq!(result.address, ORACLE.to_ascii_lowercase());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn factory_deployment_adds_evidence() {
        let node = deployed_node(chainlink_bytecode(), CHAINLINK_DEPLOYER);
        let identifier = OracleIdentifier::new(node);
        let result = identifier.identify(ORACLE).await;

        assert_eq!(result.oracle_type, OracleType::Chainlink);
        assert_eq!(result.factory_match, Some(true));
        assert!(close(result.confidence, 0.6 * 3.0 / 7.0 + 0.1));
    }

    #[tokio::test]
    async fn unmatched_bytecode_is_unknown() {
        let node = deployed_node("0x6080604052deadbeef00".into(), "0xnobody");
        let identifier = OracleIdentifier::new(node);
        let result = identifier.identify(ORACLE).await;

        assert_eq!(result.oracle_type, OracleType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.is_none());
        assert!(result.factory_match.is_none());
    }

    #[tokio::test]
    async fn identify_is_idempotent() {
        let node = deployed_node(chainlink_bytecode(), CHAINLINK_DEPLOYER);
        let identifier = OracleIdentifier::new(node);
        let first = identifier.identify(ORACLE).await;
        let second = identifier.identify(ORACLE).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rpc_failure_folds_into_unknown() {
        let node = MockNode {
            fail_get_code: true,
            ..Default::default()
        };
        let identifier = OracleIdentifier::new(node);
        let result = identifier.identify(ORACLE).await;

        assert_eq!(result.oracle_type, OracleType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.as_deref().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn identify_all_memoizes_per_address() {
        let node = deployed_node(chainlink_bytecode(), "0xnobody");
        let identifier = OracleIdentifier::new(node);

        let addresses = vec![
            ORACLE.to_string(),
            ORACLE.to_ascii_lowercase(), // same address, different case
            ORACLE.to_string(),
        ];
        let before = identifier.client.code_calls.load(Ordering::Relaxed);
        let results = identifier.identify_all(addresses).await;
        let after = identifier.client.code_calls.load(Ordering::Relaxed);

        assert_eq!(results.len(), 1);
        let result = &results[&ORACLE.to_ascii_lowercase()];
        assert_eq!(result.oracle_type, OracleType::Chainlink);
        // One latest-code fetch plus the deployer binary search, once.
        assert!(after - before <= 1 + 5);
    }
}
