use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use block_engine::{Summary, Transaction};
use log::info;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

/// Appends one summary row to the run log at `path`.
///
/// The header is written only when the log is new or empty.
pub fn append_summary(path: &Path, summary: &Summary) -> Result<()> {
    ensure_parent(path)?;
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening run log {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
    writer.serialize(summary).context("writing summary row")?;
    writer.flush().context("flushing run log")?;

    info!("appended summary to {}", path.display());
    Ok(())
}

// one transaction hash per line, in admission order
pub fn write_block_to_file(path: &Path, block: &[&Transaction]) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for tx in block {
        writeln!(writer, "{}", tx.hash)?;
    }
    writer.flush()?;

    info!("wrote {} transactions to {}", block.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(algorithm: &str) -> Summary {
        Summary {
            algorithm: algorithm.to_string(),
            simulated_timestamp_ms: 1_752_451_206_000,
            total_transactions: 1_000,
            included: 412,
            gas_used: 29_998_700,
            utility_total: 1_234_567_890_123,
            utility_real: None,
            fragmentation: 1_300,
            lead_time_avg_s: Some(4.213),
            elapsed_s: 0.5123,
            evaluated: 300,
            truncated: true,
            fingerprint: "ab".repeat(32),
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("logs.csv");

        append_summary(&path, &summary("heuristico")).unwrap();
        append_summary(&path, &summary("hibrido_top500")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("algoritmo,timestamp_simulado,total_transacciones"));
        assert!(lines[1].starts_with("heuristico,"));
        assert!(lines[2].starts_with("hibrido_top500,"));
    }

    #[test]
    fn rows_read_back_as_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.csv");
        let mut empty = summary("hibrido_extendido_top300_greedy_agresivo");
        empty.included = 0;
        empty.lead_time_avg_s = None;
        empty.utility_real = Some(0);

        append_summary(&path, &summary("heuristico")).unwrap();
        append_summary(&path, &empty).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<Summary> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![summary("heuristico"), empty]);
    }

    #[test]
    fn block_file_lists_hashes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.txt");
        let txs: Vec<Transaction> = ["0x2", "0x1"]
            .iter()
            .map(|h| Transaction {
                hash: h.to_string(),
                from: "a".into(),
                to: "b".into(),
                gas: 1,
                gas_fee_cap: 1,
                timestamp_ms: 0,
                nonce: None,
            })
            .collect();
        let block: Vec<&Transaction> = txs.iter().collect();

        write_block_to_file(&path, &block).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0x2\n0x1\n");
    }
}
