//! Block-level metrics derived from a finished selection.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// One row of the run log. Serialised field names are the log's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "algoritmo")]
    pub algorithm: String,
    #[serde(rename = "timestamp_simulado")]
    pub simulated_timestamp_ms: i64,
    #[serde(rename = "total_transacciones")]
    pub total_transactions: usize,
    #[serde(rename = "tx_incluidas")]
    pub included: usize,
    #[serde(rename = "gas_usado")]
    pub gas_used: u64,
    /// Sum of the fees carried by the selected transactions
    #[serde(rename = "utilidad_total_heuristica")]
    pub utility_total: u128,
    /// Sum of `gas * gas_fee_cap` recomputed from the raw fields, reported only
    /// by strategies that distinguish it
    #[serde(rename = "utilidad_total_real")]
    pub utility_real: Option<u128>,
    /// Gas left unused; negative only for a selection over the limit
    #[serde(rename = "fragmentacion")]
    pub fragmentation: i128,
    /// `None` when nothing was included
    #[serde(rename = "lead_time_promedio_s")]
    pub lead_time_avg_s: Option<f64>,
    #[serde(rename = "tiempo_ejecucion_s")]
    pub elapsed_s: f64,
    /// Transactions the candidate generator worked on
    #[serde(rename = "tx_evaluadas")]
    pub evaluated: usize,
    /// A generation cap dropped admissible candidates
    #[serde(rename = "candidatos_truncados")]
    pub truncated: bool,
    /// Hex SHA-256 over the selected hashes in admission order
    #[serde(rename = "huella_bloque")]
    pub fingerprint: String,
}

/// Everything the summary is computed from.
#[derive(Debug)]
pub struct Outcome<'a> {
    pub algorithm: String,
    pub txs: &'a [Transaction],
    /// Selected positions in admission order
    pub selected: &'a [usize],
    pub simulated_timestamp_ms: i64,
    pub gas_limit: u64,
    pub evaluated: usize,
    pub truncated: bool,
    pub report_real_utility: bool,
    pub elapsed: Duration,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// digest of the selected hashes, newline separated
pub fn fingerprint(txs: &[Transaction], selected: &[usize]) -> String {
    let mut hasher = Sha256::new();
    for &i in selected {
        hasher.update(txs[i].hash.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

pub fn summarize(outcome: &Outcome<'_>) -> Summary {
    let block: Vec<&Transaction> = outcome.selected.iter().map(|&i| &outcome.txs[i]).collect();

    // totals saturate; a selection built under a u64 limit never reaches the bound
    let gas_used = block.iter().fold(0u64, |acc, tx| acc.saturating_add(tx.gas));
    let utility_total = block.iter().fold(0u128, |acc, tx| acc.saturating_add(tx.fee()));
    let utility_real: Option<u128> = outcome.report_real_utility.then(|| {
        block.iter().fold(0u128, |acc, tx| {
            acc.saturating_add(tx.gas as u128 * tx.gas_fee_cap as u128)
        })
    });

    let lead_time_avg_s = if block.is_empty() {
        None
    } else {
        let total_ms: f64 = block
            .iter()
            .map(|tx| (outcome.simulated_timestamp_ms as i128 - tx.timestamp_ms as i128) as f64)
            .sum();
        Some(round_to(total_ms / block.len() as f64 / 1000.0, 3))
    };

    Summary {
        algorithm: outcome.algorithm.clone(),
        simulated_timestamp_ms: outcome.simulated_timestamp_ms,
        total_transactions: outcome.txs.len(),
        included: block.len(),
        gas_used,
        utility_total,
        utility_real,
        fragmentation: outcome.gas_limit as i128 - gas_used as i128,
        lead_time_avg_s,
        elapsed_s: round_to(outcome.elapsed.as_secs_f64(), 4),
        evaluated: outcome.evaluated,
        truncated: outcome.truncated,
        fingerprint: fingerprint(outcome.txs, outcome.selected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::fixtures::tx;

    fn outcome<'a>(txs: &'a [Transaction], selected: &'a [usize]) -> Outcome<'a> {
        Outcome {
            algorithm: "heuristico".to_string(),
            txs,
            selected,
            simulated_timestamp_ms: 10_000,
            gas_limit: 100,
            evaluated: txs.len(),
            truncated: false,
            report_real_utility: false,
            elapsed: Duration::from_micros(123_456),
        }
    }

    #[test]
    fn aggregates_selected_transactions() {
        let mut txs = vec![
            tx("t0", "a", "b", 10, 5),
            tx("t1", "c", "d", 20, 2),
            tx("t2", "e", "f", 30, 1),
        ];
        txs[0].timestamp_ms = 7_000;
        txs[2].timestamp_ms = 8_000;

        let selected = [0, 2];
        let summary = summarize(&outcome(&txs, &selected));

        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.included, 2);
        assert_eq!(summary.gas_used, 40);
        assert_eq!(summary.utility_total, 80);
        assert_eq!(summary.utility_real, None);
        assert_eq!(summary.fragmentation, 60);
        // (3000 + 2000) / 2 ms
        assert_eq!(summary.lead_time_avg_s, Some(2.5));
        assert_eq!(summary.elapsed_s, 0.1235);
    }

    #[test]
    fn real_utility_reported_on_request() {
        let txs = vec![tx("t0", "a", "b", 10, 5)];
        let selected = [0];
        let mut o = outcome(&txs, &selected);
        o.report_real_utility = true;
        assert_eq!(summarize(&o).utility_real, Some(50));
    }

    #[test]
    fn empty_selection_is_defined() {
        let txs = vec![tx("t0", "a", "b", 10, 5)];
        let summary = summarize(&outcome(&txs, &[]));
        assert_eq!(summary.included, 0);
        assert_eq!(summary.gas_used, 0);
        assert_eq!(summary.utility_total, 0);
        assert_eq!(summary.lead_time_avg_s, None);
        assert_eq!(summary.fragmentation, 100);
    }

    #[test]
    fn fragmentation_can_be_negative() {
        let txs = vec![tx("t0", "a", "b", 150, 1)];
        let summary = summarize(&outcome(&txs, &[0]));
        assert_eq!(summary.fragmentation, -50);
    }

    #[test]
    fn maximum_gas_values_are_representable() {
        let txs = vec![tx("t0", "a", "b", u64::MAX, u64::MAX), tx("t1", "c", "d", 5, 1)];
        let mut o = outcome(&txs, &[0, 1]);
        o.gas_limit = u64::MAX;
        let summary = summarize(&o);
        assert_eq!(summary.gas_used, u64::MAX);
        assert_eq!(summary.fragmentation, 0);
        assert_eq!(summary.utility_total, u64::MAX as u128 * u64::MAX as u128 + 5);

        let none = summarize(&Outcome { gas_limit: u64::MAX, ..outcome(&txs, &[]) });
        assert_eq!(none.fragmentation, u64::MAX as i128);
    }

    #[test]
    fn fingerprint_depends_on_admission_order() {
        let txs = vec![tx("t0", "a", "b", 1, 1), tx("t1", "c", "d", 1, 1)];
        assert_eq!(fingerprint(&txs, &[0, 1]), fingerprint(&txs, &[0, 1]));
        assert_ne!(fingerprint(&txs, &[0, 1]), fingerprint(&txs, &[1, 0]));
        assert_eq!(fingerprint(&txs, &[]).len(), 64);
    }

    #[test]
    fn serialises_with_log_column_names() {
        let txs = vec![tx("t0", "a", "b", 10, 5)];
        let summary = summarize(&outcome(&txs, &[0]));
        let json = serde_json::to_value(&summary).expect("serialise");
        for column in [
            "algoritmo",
            "timestamp_simulado",
            "total_transacciones",
            "tx_incluidas",
            "gas_usado",
            "utilidad_total_heuristica",
            "utilidad_total_real",
            "fragmentacion",
            "lead_time_promedio_s",
            "tiempo_ejecucion_s",
        ] {
            assert!(json.get(column).is_some(), "missing column {column}");
        }
    }
}
