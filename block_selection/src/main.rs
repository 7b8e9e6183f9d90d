mod checks;
mod parser;
mod write;

use std::path::PathBuf;

use anyhow::{Context, Result};
use block_engine::{build_block, simulated_timestamp, EngineConfig, Strategy};
use clap::Parser;
use log::info;

/// Simulates building a block from a mempool snapshot.
#[derive(Parser, Debug)]
#[command(name = "block_selection", version, about)]
struct Cli {
    /// Mempool CSV export (hash, from, to, gas, gas_fee_cap, timestamp_ms[, nonce])
    dataset: PathBuf,

    /// Number of rows to load from the dataset
    #[arg(long, default_value_t = 1_000)]
    rows: usize,

    /// Selection strategy: pairwise, hybrid or extended
    #[arg(long, short, default_value = "extended")]
    strategy: Strategy,

    /// TOML file with an [engine] table
    #[arg(long, short, env = "BLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Override the block gas limit
    #[arg(long)]
    gas_limit: Option<u64>,

    /// Override the pre-filter size
    #[arg(long)]
    top_n: Option<usize>,

    /// Override the inclusion delay added to the mean arrival time
    #[arg(long)]
    delay_ms: Option<i64>,

    /// Run log the summary is appended to
    #[arg(long, default_value = "logs/logs.csv")]
    log: PathBuf,

    /// Also write the selected transaction hashes to this file
    #[arg(long)]
    block_out: Option<PathBuf>,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(gas_limit) = self.gas_limit {
            config.gas_limit = gas_limit;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = Some(top_n);
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.engine_config()?;

    let mempool_transactions = parser::load_transactions(&cli.dataset, cli.rows)?;
    let simulated_ts = simulated_timestamp(&mempool_transactions, config.delay_ms);
    info!(
        "building block with {} strategy at simulated timestamp {}",
        cli.strategy, simulated_ts
    );

    let block = build_block(&mempool_transactions, simulated_ts, &config, cli.strategy)?;
    checks::verify_block(&block, &mempool_transactions, config.gas_limit)?;

    println!("{}", serde_json::to_string_pretty(&block.summary)?);

    write::append_summary(&cli.log, &block.summary)?;
    if let Some(path) = &cli.block_out {
        write::write_block_to_file(path, &block.transactions(&mempool_transactions))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_precedence() {
        let cli = Cli::parse_from([
            "block_selection",
            "mempool.csv",
            "--strategy",
            "hybrid",
            "--gas-limit",
            "15000000",
            "--top-n",
            "100",
        ]);
        assert_eq!(cli.strategy, Strategy::Hybrid);
        assert_eq!(cli.rows, 1_000);
        assert_eq!(cli.log, PathBuf::from("logs/logs.csv"));

        let config = cli.engine_config().unwrap();
        assert_eq!(config.gas_limit, 15_000_000);
        assert_eq!(config.top_n, Some(100));
        assert_eq!(config.delay_ms, 6_000);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let result = Cli::try_parse_from(["block_selection", "mempool.csv", "-s", "greedy"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
