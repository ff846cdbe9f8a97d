//! Per-protocol bytecode signature patterns.
//!
//! Each supported protocol gets one hand-curated [`SignaturePattern`]:
//! opcode-prefixed selector fragments, storage-layout fragments, a minimum
//! function-match threshold, and (where known) factory deployer addresses.
//! Adding a protocol means adding one entry to [`SignatureCatalog::builtin`];
//! no other component changes.

use oraclescan_core::OracleType;

/// Pattern definition for one oracle protocol.
#[derive(Debug, Clone)]
pub struct SignaturePattern {
    /// Function dispatcher fragments (`PUSH4` opcode `63` + selector hex).
    pub function_patterns: Vec<String>,
    /// Storage layout fragments.
    pub storage_patterns: Vec<String>,
    /// Minimum function matches for a positive identification. Protocols
    /// with fewer distinguishing functions get lower thresholds.
    pub required_function_matches: usize,
    /// Known factory deployer addresses (lowercase).
    pub factory_addresses: Vec<String>,
}

impl SignaturePattern {
    fn new(
        function_patterns: &[&str],
        storage_patterns: &[&str],
        required_function_matches: usize,
        factory_addresses: &[&str],
    ) -> Self {
        Self {
            function_patterns: function_patterns.iter().map(|s| s.to_string()).collect(),
            storage_patterns: storage_patterns.iter().map(|s| s.to_string()).collect(),
            required_function_matches,
            factory_addresses: factory_addresses
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Returns `true` if `deployer` is one of this pattern's known factories.
    pub fn is_factory(&self, deployer: &str) -> bool {
        self.factory_addresses
            .iter()
            .any(|f| f.eq_ignore_ascii_case(deployer))
    }
}

/// Read-only table of protocol tag → signature pattern.
///
/// Iteration order is fixed, so a confidence tie always resolves to the
/// earliest entry.
#[derive(Debug, Clone)]
pub struct SignatureCatalog {
    entries: Vec<(OracleType, SignaturePattern)>,
}

impl SignatureCatalog {
    /// The built-in catalog of supported protocols.
    pub fn builtin() -> Self {
        let entries = vec![
            (
                OracleType::Chainlink,
                SignaturePattern::new(
                    &[
                        "63feaf968c", // latestRoundData()
                        "6350d25bcd", // latestAnswer()
                        "63668a0f02", // latestTimestamp()
                        "639a6fc8f5", // getRoundData(uint80)
                        "63313ce567", // decimals()
                        "638ac28d",   // description()
                        "632fb5c8f",  // version()
                    ],
                    &["54roundId", "55answers", "54timestamp"],
                    3,
                    &[
                        // Known price-feed deployers.
                        "0x47Fb2585D2C56Fe188D0E6ec628a38b74fCeeeDf",
                        "0xf0c1f6c01dfaced1e9c6fcfbd1fd1f873bbf09ce",
                    ],
                ),
            ),
            (
                OracleType::Tellor,
                SignaturePattern::new(
                    &[
                        "63a22cb465", // getDataBefore()
                        "637584a157", // depositStake()
                        "632f1be0c",  // retrieveData()
                        "63842483d2", // getCurrentValue()
                        "635c1f0a0",  // getNewValueCountbyRequestId()
                    ],
                    &["54disputeId", "55stakeAmount", "54reportedValue"],
                    2,
                    &[],
                ),
            ),
            (
                OracleType::Uniswap,
                SignaturePattern::new(
                    &[
                        "63b7be1850", // observe(uint32[])
                        "636d154ea5", // consult()
                        "63252c8c6c", // price{0,1}CumulativeLast()
                        "639a19a593", // sync()
                    ],
                    &["54price0", "54price1", "55cumulative"],
                    2,
                    &[],
                ),
            ),
            (
                OracleType::Pyth,
                SignaturePattern::new(
                    &[
                        "63d24ce607", // getPrice()
                        "63fe834482", // queryPriceFeed()
                        "63313ce567", // decimals()
                        "63628f7074", // updatePrice()
                    ],
                    &["54priceId", "55confidence", "54expo"],
                    2,
                    &[],
                ),
            ),
            (
                OracleType::Redstone,
                SignaturePattern::new(
                    &[
                        "63d0f2e915", // getValue()
                        "63c8e4de0d", // getValueWithTimestamp()
                        "634554ee00", // validateTimestamp()
                    ],
                    &["54dataFeed", "55timestamp", "54signature"],
                    2,
                    &[],
                ),
            ),
        ];
        Self { entries }
    }

    /// Build a catalog from explicit entries (tests, extensions).
    pub fn from_entries(entries: Vec<(OracleType, SignaturePattern)>) -> Self {
        Self { entries }
    }

    /// Patterns in fixed iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &(OracleType, SignaturePattern)> {
        self.entries.iter()
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if any pattern carries factory evidence, i.e. a
    /// deployer lookup could affect some score.
    pub fn has_factory_evidence(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, p)| !p.factory_addresses.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_five_protocols() {
        let catalog = SignatureCatalog::builtin();
        assert_eq!(catalog.len(), 5);
        let tags: Vec<OracleType> = catalog.iter().map(|(t, _)| *t).collect();
        assert_eq!(tags[0], OracleType::Chainlink);
        assert!(tags.contains(&OracleType::Redstone));
    }

    #[test]
    fn thresholds_are_at_least_one() {
        for (tag, pattern) in SignatureCatalog::builtin().iter() {
            assert!(
                pattern.required_function_matches >= 1,
                "{tag} threshold below 1"
            );
            assert!(
                pattern.required_function_matches <= pattern.function_patterns.len(),
                "{tag} threshold unreachable"
            );
        }
    }

    #[test]
    fn factory_addresses_match_case_insensitively() {
        let catalog = SignatureCatalog::builtin();
        let (_, chainlink) = catalog.iter().next().unwrap();
        assert!(chainlink.is_factory("0x47FB2585D2C56FE188D0E6EC628A38B74FCEEEDF"));
        assert!(!chainlink.is_factory("0x0000000000000000000000000000000000000001"));
    }

    #[test]
    fn builtin_has_factory_evidence() {
        assert!(SignatureCatalog::builtin().has_factory_evidence());
        let empty = SignatureCatalog::from_entries(vec![]);
        assert!(!empty.has_factory_evidence());
        assert!(empty.is_empty());
    }
}
