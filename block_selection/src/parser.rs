use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use block_engine::Transaction;
use log::info;

// columns every dataset row must carry; nonce is optional
const REQUIRED_COLUMNS: [&str; 6] = ["hash", "from", "to", "gas", "gas_fee_cap", "timestamp_ms"];

/// Reads at most `rows` transactions from a mempool CSV export.
pub fn load_transactions(path: &Path, rows: usize) -> Result<Vec<Transaction>> {
    let file = File::open(path).with_context(|| format!("opening dataset {}", path.display()))?;
    let txs = read_transactions(file, rows).with_context(|| format!("reading {}", path.display()))?;
    info!("loaded {} transactions from {}", txs.len(), path.display());
    Ok(txs)
}

pub fn read_transactions<R: Read>(reader: R, rows: usize) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers().context("reading header row")?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("missing required column {column:?}");
        }
    }

    let mut txs = Vec::with_capacity(rows.min(4_096));
    for (row, record) in reader.deserialize::<Transaction>().take(rows).enumerate() {
        // header is line 1
        let tx = record.with_context(|| format!("malformed transaction on line {}", row + 2))?;
        txs.push(tx);
    }
    Ok(txs)
}
