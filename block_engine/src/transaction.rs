use serde::{Deserialize, Serialize};

/// A pending transaction as read from the mempool dataset.
///
/// Inside a single run a transaction is identified by its position in the
/// input slice; `hash` must be unique across that slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub gas: u64,
    pub gas_fee_cap: u64,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub nonce: Option<u64>,
}

impl Transaction {
    // total fee offered, gas * gas_fee_cap
    pub fn fee(&self) -> u128 {
        self.gas as u128 * self.gas_fee_cap as u128
    }

    // both endpoints, sender first
    pub fn addresses(&self) -> [&str; 2] {
        [self.from.as_str(), self.to.as_str()]
    }
}

/// Instant at which the simulated block is assumed to be sealed: the
/// (truncated) mean arrival time of the set plus `delay_ms`.
///
/// An empty set has no arrival times, its mean is taken as zero.
pub fn simulated_timestamp(txs: &[Transaction], delay_ms: i64) -> i64 {
    if txs.is_empty() {
        return delay_ms;
    }
    let sum: i128 = txs.iter().map(|tx| tx.timestamp_ms as i128).sum();
    let mean = sum as f64 / txs.len() as f64;
    (mean.trunc() as i64).saturating_add(delay_ms)
}


#[cfg(test)]
mod tests {
    use super::fixtures::tx;
    use super::*;

    #[test]
    fn fee_is_gas_times_cap() {
        let t = tx("a", "x", "y", 21_000, 30_000_000_000);
        assert_eq!(t.fee(), 630_000_000_000_000);
    }

    #[test]
    fn fee_does_not_overflow_u64() {
        let t = tx("a", "x", "y", u64::MAX, 2);
        assert_eq!(t.fee(), u64::MAX as u128 * 2);
    }

    #[test]
    fn simulated_timestamp_uses_truncated_mean() {
        let mut a = tx("a", "x", "y", 1, 1);
        let mut b = tx("b", "x", "y", 1, 1);
        a.timestamp_ms = 1_000;
        b.timestamp_ms = 1_001;
        assert_eq!(simulated_timestamp(&[a, b], 6_000), 7_000);
    }

    #[test]
    fn simulated_timestamp_of_empty_set_is_delay() {
        assert_eq!(simulated_timestamp(&[], 6_000), 6_000);
    }
}
