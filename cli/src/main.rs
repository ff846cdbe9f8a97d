//! oraclescan CLI — scan a lending protocol's market creations and classify
//! the price oracles they reference.
//!
//! Usage:
//! ```bash
//! # Full pipeline: fetch events, classify oracles, write reports
//! RPC_URL=https://cloudflare-eth.com \
//! CONTRACT_ADDRESS=0xBBBBBbbBBb9cC5e90e3b3Af64bdAF62C37EEFFCb \
//! oraclescan analyze --from 18883124 --to 19000000
//!
//! # Classify one oracle address
//! oraclescan identify --url https://cloudflare-eth.com --address 0x...
//!
//! # Look up one market's creation parameters
//! oraclescan params --id 0x...
//! ```

use std::env;
use std::process;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use oraclescan_core::{normalize_address, AnalyzerConfig};
use oraclescan_market::{FetcherConfig, MarketEventFetcher};
use oraclescan_oracle::OracleIdentifier;
use oraclescan_report::{log_summary, AnalysisStats, ReportWriter};
use oraclescan_rpc::{EthClient, EthRpcClient, HttpRpcClient};

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "analyze" => cmd_analyze(&args[2..]).await,
        "identify" => cmd_identify(&args[2..]).await,
        "params" => cmd_params(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("oraclescan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn print_usage() {
    println!("oraclescan {}", env!("CARGO_PKG_VERSION"));
    println!("Scan lending markets and classify their price oracles\n");
    println!("USAGE:");
    println!("    oraclescan <COMMAND>\n");
    println!("COMMANDS:");
    println!("    analyze   Fetch market events, classify oracles, write reports");
    println!("    identify  Classify a single oracle address");
    println!("    params    Look up one market's creation parameters");
    println!("    version   Print version");
    println!("    help      Print this help\n");
    println!("ANALYZE FLAGS (override environment):");
    println!("    --url <URL>        RPC endpoint        [env: RPC_URL]");
    println!("    --contract <ADDR>  Protocol contract   [env: CONTRACT_ADDRESS]");
    println!("    --from <BLOCK>     First block         [env: START_BLOCK]");
    println!("    --to <BLOCK>       Last block          [env: END_BLOCK, default: head]");
    println!("    --batch <BLOCKS>   Sub-range size      [env: BATCH_SIZE]");
    println!("    --out <DIR>        Output directory    [env: OUTPUT_DIR]");
}

async fn cmd_analyze(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    config.validate()?;

    let client = EthClient::new(HttpRpcClient::default_for(&config.rpc_url));
    let end_block = match config.end_block {
        Some(block) => block,
        None => client
            .get_block_number()
            .await
            .context("failed to resolve chain head")?,
    };

    let fetcher_config = FetcherConfig {
        contract_address: config.contract_address.clone(),
        max_retries: config.max_retries,
        base_delay: Duration::from_millis(config.base_delay_ms),
        request_delay: Duration::from_millis(config.request_delay_ms),
    };
    let fetcher = MarketEventFetcher::new(client, fetcher_config);
    let markets = fetcher
        .fetch_events(config.start_block, end_block, config.batch_size)
        .await?;

    let oracles: Vec<String> = markets
        .iter()
        .map(|m| normalize_address(&m.params.oracle))
        .collect();

    let identifier =
        OracleIdentifier::new(EthClient::new(HttpRpcClient::default_for(&config.rpc_url)));
    let results = identifier.identify_all(&oracles).await;

    let writer = ReportWriter::new(&config.output_dir);
    writer.write_all(&markets, &results)?;
    log_summary(&AnalysisStats::from_results(&markets, &results));
    Ok(())
}

async fn cmd_identify(args: &[String]) -> Result<()> {
    let url = flag_or_env(args, "--url", "RPC_URL").ok_or_else(|| anyhow!("--url is required"))?;
    let address = parse_flag(args, "--address").ok_or_else(|| anyhow!("--address is required"))?;

    let identifier = OracleIdentifier::new(EthClient::new(HttpRpcClient::default_for(&url)));
    let result = identifier.identify(&address).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_params(args: &[String]) -> Result<()> {
    let url = flag_or_env(args, "--url", "RPC_URL").ok_or_else(|| anyhow!("--url is required"))?;
    let contract = flag_or_env(args, "--contract", "CONTRACT_ADDRESS")
        .ok_or_else(|| anyhow!("--contract is required"))?;
    let id = parse_flag(args, "--id").ok_or_else(|| anyhow!("--id is required"))?;

    let client = EthClient::new(HttpRpcClient::default_for(&url));
    let fetcher = MarketEventFetcher::new(client, FetcherConfig::new(contract));
    match fetcher.lookup_params(&id).await? {
        Some(params) => println!("{}", serde_json::to_string_pretty(&params)?),
        None => println!("Market {id} not found"),
    }
    Ok(())
}

/// Environment config with command-line overrides applied on top.
fn load_config(args: &[String]) -> Result<AnalyzerConfig> {
    let mut config = AnalyzerConfig::from_env()?;
    if let Some(url) = parse_flag(args, "--url") {
        config.rpc_url = url;
    }
    if let Some(contract) = parse_flag(args, "--contract") {
        config.contract_address = contract;
    }
    if let Some(from) = parse_flag(args, "--from") {
        config.start_block = from.parse().context("invalid --from block")?;
    }
    if let Some(to) = parse_flag(args, "--to") {
        config.end_block = Some(to.parse().context("invalid --to block")?);
    }
    if let Some(batch) = parse_flag(args, "--batch") {
        config.batch_size = batch.parse().context("invalid --batch size")?;
    }
    if let Some(out) = parse_flag(args, "--out") {
        config.output_dir = out;
    }
    Ok(config)
}

fn flag_or_env(args: &[String], flag: &str, var: &str) -> Option<String> {
    parse_flag(args, flag).or_else(|| env::var(var).ok())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
