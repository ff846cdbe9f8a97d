//! oraclescan-market — market-creation event decoding and the batched,
//! retrying block-range fetcher.
//!
//! # Pipeline
//!
//! ```text
//! [start, end] ──split──▶ sub-ranges ──eth_getLogs──▶ RawLog
//!                             │ (retry: base_delay * attempt)         │
//!                             │ (skip after max_retries)              ▼
//!                             └──────────────────────────▶ MarketEvent (ordered)
//! ```

pub mod event;
pub mod fetcher;

pub use event::{
    decode_create_market, decode_market_params, event_topic, function_selector,
    CREATE_MARKET_SIGNATURE, ID_TO_MARKET_PARAMS_SIGNATURE,
};
pub use fetcher::{block_batches, FetcherConfig, MarketEventFetcher};
