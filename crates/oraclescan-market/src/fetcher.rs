//! The batched, retrying market-event fetcher.
//!
//! Splits `[start_block, end_block]` into consecutive inclusive sub-ranges of
//! `batch_size` blocks and fetches each with one `eth_getLogs` query. A
//! transient failure retries the same sub-range with linear backoff; a
//! sub-range that exhausts its retries is skipped with a warning and the
//! fetch moves on; a completed run with partial data beats an aborted run.

use std::time::Duration;

use oraclescan_core::{AnalysisError, MarketEvent, MarketParams};
use oraclescan_rpc::{EthRpcClient, LogFilter, RetryConfig, RetryPolicy};

use crate::event::{
    decode_create_market, decode_market_params, event_topic, function_selector,
    CREATE_MARKET_SIGNATURE, ID_TO_MARKET_PARAMS_SIGNATURE,
};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Address of the lending protocol contract emitting CreateMarket.
    pub contract_address: String,
    /// Retries per sub-range before it is skipped.
    pub max_retries: u32,
    /// Base delay for linear retry backoff.
    pub base_delay: Duration,
    /// Courtesy delay between sub-range requests, success or failure.
    pub request_delay: Duration,
}

impl FetcherConfig {
    pub fn new(contract_address: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            request_delay: Duration::from_millis(100),
        }
    }
}

/// Partition `[start, end]` into consecutive, non-overlapping, inclusive
/// sub-ranges of `batch_size` blocks; the final sub-range may be shorter.
pub fn block_batches(start: u64, end: u64, batch_size: u64) -> Vec<(u64, u64)> {
    let mut batches = Vec::new();
    let mut current = start;
    while current <= end {
        let batch_end = current.saturating_add(batch_size - 1).min(end);
        batches.push((current, batch_end));
        if batch_end == u64::MAX {
            break;
        }
        current = batch_end + 1;
    }
    batches
}

/// Fetches market-creation events over a block range.
pub struct MarketEventFetcher<C> {
    client: C,
    config: FetcherConfig,
    topic0: String,
}

impl<C: EthRpcClient> MarketEventFetcher<C> {
    pub fn new(client: C, config: FetcherConfig) -> Self {
        Self {
            client,
            config,
            topic0: event_topic(CREATE_MARKET_SIGNATURE),
        }
    }

    /// Fetch all CreateMarket events in `[start_block, end_block]`, in node
    /// order (ascending block number, then log index).
    ///
    /// Fails fast on a structurally invalid request; individual sub-range
    /// failures are contained and logged.
    pub async fn fetch_events(
        &self,
        start_block: u64,
        end_block: u64,
        batch_size: u64,
    ) -> Result<Vec<MarketEvent>, AnalysisError> {
        if start_block > end_block {
            return Err(AnalysisError::InvalidRange {
                start: start_block,
                end: end_block,
            });
        }
        if batch_size == 0 {
            return Err(AnalysisError::InvalidBatchSize);
        }

        let batches = block_batches(start_block, end_block, batch_size);
        tracing::info!(
            start_block,
            end_block,
            batches = batches.len(),
            "fetching market creation events"
        );

        let mut all_events = Vec::new();
        for (from, to) in batches {
            match self.fetch_batch_with_retry(from, to).await {
                Ok(events) => {
                    tracing::debug!(from, to, count = events.len(), "sub-range complete");
                    all_events.extend(events);
                }
                Err(e) => {
                    tracing::warn!(from, to, error = %e, "sub-range skipped");
                }
            }
            // Rate-limit courtesy to the node, success or failure.
            tokio::time::sleep(self.config.request_delay).await;
        }

        tracing::info!(total = all_events.len(), "event fetch complete");
        Ok(all_events)
    }

    /// Fetch one sub-range, retrying transient failures with linear backoff.
    async fn fetch_batch_with_retry(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<MarketEvent>, AnalysisError> {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: self.config.max_retries,
            base_delay: self.config.base_delay,
        });

        let mut attempt = 0u32;
        loop {
            match self.fetch_batch(from, to).await {
                Ok(events) => return Ok(events),
                Err(e) if e.is_transient() => {
                    attempt += 1;
                    match policy.next_delay(attempt) {
                        Some(delay) => {
                            tracing::warn!(
                                from,
                                to,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "retrying sub-range"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One log-filter query plus block-timestamp resolution for each hit.
    async fn fetch_batch(&self, from: u64, to: u64) -> Result<Vec<MarketEvent>, AnalysisError> {
        let filter = LogFilter {
            address: self.config.contract_address.clone(),
            topic0: self.topic0.clone(),
            from_block: from,
            to_block: to,
        };
        let logs = self.client.get_logs(&filter).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let timestamp = self
                .client
                .get_block(log.block_number_u64())
                .await?
                .map(|block| block.timestamp_i64());
            events.push(decode_create_market(log, timestamp)?);
        }
        Ok(events)
    }

    /// Point query of the contract's id → params mapping.
    ///
    /// Returns `Ok(None)` for an unmapped id or a failed call; errors only on
    /// a structurally invalid id.
    pub async fn lookup_params(
        &self,
        market_id: &str,
    ) -> Result<Option<MarketParams>, AnalysisError> {
        let id = market_id.strip_prefix("0x").unwrap_or(market_id);
        if id.len() != 64 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AnalysisError::Decode(format!(
                "market id is not 32 bytes of hex: {market_id}"
            )));
        }

        let data = format!(
            "{}{}",
            function_selector(ID_TO_MARKET_PARAMS_SIGNATURE),
            id.to_ascii_lowercase()
        );

        let return_data = match self.client.call(&self.config.contract_address, &data).await {
            Ok(ret) => ret,
            Err(e) => {
                tracing::warn!(market_id, error = %e, "params lookup failed");
                return Ok(None);
            }
        };

        match decode_market_params(&return_data) {
            // An unmapped id yields the mapping's all-zero default.
            Ok(params) if params.loan_token == ZERO_ADDRESS && params.oracle == ZERO_ADDRESS => {
                Ok(None)
            }
            Ok(params) => Ok(Some(params)),
            Err(e) => {
                tracing::warn!(market_id, error = %e, "params lookup returned malformed data");
                Ok(None)
            }
        }
    }
}
