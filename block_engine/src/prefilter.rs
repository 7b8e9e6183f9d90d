use std::collections::HashSet;

use log::debug;

use crate::transaction::Transaction;

/// How the working set is narrowed before candidate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefilter {
    /// Every transaction, in input order
    All,
    /// The `top_n` highest-fee transactions
    TopByFee { top_n: usize },
    /// The `top_n` highest-fee transactions followed by every other
    /// transaction whose sender is a top sender or whose destination is a top
    /// destination, truncated to `cap`
    TopWithRelated { top_n: usize, cap: usize },
}

// positions of the top_n transactions by fee, highest first; equal fees keep input order
fn top_by_fee(txs: &[Transaction], top_n: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..txs.len()).collect();
    ranked.sort_by(|&a, &b| txs[b].fee().cmp(&txs[a].fee()));
    ranked.truncate(top_n);
    ranked
}

/// Positions (into `txs`) of the working set for `filter`, in working order.
pub fn working_set(txs: &[Transaction], filter: Prefilter) -> Vec<usize> {
    let set: Vec<usize> = match filter {
        Prefilter::All => (0..txs.len()).collect(),
        Prefilter::TopByFee { top_n } => top_by_fee(txs, top_n),
        Prefilter::TopWithRelated { top_n, cap } => {
            let top = top_by_fee(txs, top_n);

            let mut seen_hashes: HashSet<&str> = HashSet::with_capacity(txs.len());
            let mut top_senders: HashSet<&str> = HashSet::new();
            let mut top_destinations: HashSet<&str> = HashSet::new();
            for &i in &top {
                seen_hashes.insert(&txs[i].hash);
                top_senders.insert(&txs[i].from);
                top_destinations.insert(&txs[i].to);
            }

            let related = (0..txs.len()).filter(|&i| {
                let tx = &txs[i];
                !seen_hashes.contains(tx.hash.as_str())
                    && (top_senders.contains(tx.from.as_str())
                        || top_destinations.contains(tx.to.as_str()))
            });

            let mut set = top;
            set.extend(related);
            set.truncate(cap);
            set
        }
    };

    debug!(
        "working set: {} of {} transactions ({:?})",
        set.len(),
        txs.len(),
        filter
    );
    set
}
