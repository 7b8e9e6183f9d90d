//! Candidate generation.
//!
//! A candidate is a small group of transactions (one, two or three) that the
//! packer admits or rejects as a unit. Generation walks the working set in the
//! canonical nested-loop order (ascending working positions) and stops once a
//! cap is reached. Groups whose members share an address, or whose gas does not
//! fit the block, are never generated and do not count toward a cap. Rows of the outer loop are evaluated in parallel batches
//! and merged in order, so the result is the same as the sequential loop.

use std::collections::HashSet;

use log::debug;
use rayon::prelude::*;

use crate::config::Weights;
use crate::transaction::Transaction;
use crate::utility::{fee_score, pair_utility, Utility};

// outer-loop rows evaluated per parallel batch
const ROWS_PER_BATCH: usize = 64;

#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Positions into the input slice, in working-set order
    pub members: Vec<usize>,
    /// Sum of member gas, fixed at generation time
    pub gas_total: u64,
    pub utility: Utility,
    /// Every sender and destination among the members, sorted and deduplicated
    pub addrs: Vec<&'a str>,
}

impl<'a> Candidate<'a> {
    fn new(txs: &'a [Transaction], members: Vec<usize>, gas_total: u64, utility: Utility) -> Self {
        let mut addrs = Vec::with_capacity(members.len() * 2);
        for &m in &members {
            addrs.extend(txs[m].addresses());
        }
        addrs.sort_unstable();
        addrs.dedup();
        Self {
            members,
            gas_total,
            utility,
            addrs,
        }
    }

    pub fn arity(&self) -> usize {
        self.members.len()
    }
}

/// Candidates produced by one generation pass.
#[derive(Debug, Default)]
pub struct Generation<'a> {
    pub candidates: Vec<Candidate<'a>>,
    /// At least one admissible candidate was dropped by the cap
    pub truncated: bool,
}

impl<'a> Generation<'a> {
    /// Candidates by descending utility; equal utilities keep generation order.
    pub fn ranked(mut self) -> Vec<Candidate<'a>> {
        self.candidates.sort_by(|a, b| b.utility.cmp(&a.utility));
        self.candidates
    }
}

/// Enumerates candidates over a working set.
pub struct Generator<'a> {
    txs: &'a [Transaction],
    working: &'a [usize],
    gas_limit: u64,
    weights: Weights,
}

impl<'a> Generator<'a> {
    pub fn new(txs: &'a [Transaction], working: &'a [usize], gas_limit: u64, weights: Weights) -> Self {
        Self {
            txs,
            working,
            gas_limit,
            weights,
        }
    }

    fn utility(&self, i: usize, j: usize) -> i128 {
        pair_utility(&self.txs[i], &self.txs[j], self.gas_limit, &self.weights)
    }

    // combined gas, None when it overflows or exceeds the block
    fn fitting_gas(&self, members: &[usize]) -> Option<u64> {
        members
            .iter()
            .try_fold(0u64, |acc, &m| acc.checked_add(self.txs[m].gas))
            .filter(|&gas| gas <= self.gas_limit)
    }

    // no sender or destination of one transaction appears in the other
    fn exclusive(&self, i: usize, j: usize) -> bool {
        let [a, b] = self.txs[i].addresses();
        let [c, d] = self.txs[j].addresses();
        a != c && a != d && b != c && b != d
    }

    /// Every unordered pair of address-disjoint working transactions not in
    /// `excluded` whose combined gas fits the block, scored with one utility
    /// call.
    pub fn pairs(&self, excluded: &HashSet<usize>, cap: Option<usize>) -> Generation<'a> {
        let n = self.working.len();
        let generation = enumerate(n, cap, |a, limit| {
            let mut row = Vec::new();
            let i = self.working[a];
            if excluded.contains(&i) {
                return row;
            }
            for &j in &self.working[a + 1..] {
                if excluded.contains(&j) || !self.exclusive(i, j) {
                    continue;
                }
                let Some(gas_total) = self.fitting_gas(&[i, j]) else {
                    continue;
                };
                let utility = Utility::single(self.utility(i, j));
                row.push(Candidate::new(self.txs, vec![i, j], gas_total, utility));
                if row.len() >= limit {
                    break;
                }
            }
            row
        });
        debug!(
            "generated {} pair candidates (truncated: {})",
            generation.candidates.len(),
            generation.truncated
        );
        generation
    }

    /// Every unordered triple of pairwise address-disjoint working
    /// transactions whose combined gas fits the block, scored with the mean of
    /// its three pairwise utilities.
    pub fn triples(&self, cap: Option<usize>) -> Generation<'a> {
        let n = self.working.len();
        let generation = enumerate(n, cap, |a, limit| {
            let mut row = Vec::new();
            let i = self.working[a];
            'outer: for (b, &j) in self.working.iter().enumerate().skip(a + 1) {
                if !self.exclusive(i, j) {
                    continue;
                }
                for &k in &self.working[b + 1..] {
                    if !self.exclusive(i, k) || !self.exclusive(j, k) {
                        continue;
                    }
                    let Some(gas_total) = self.fitting_gas(&[i, j, k]) else {
                        continue;
                    };
                    let utility =
                        Utility::mean(&[self.utility(i, j), self.utility(i, k), self.utility(j, k)]);
                    row.push(Candidate::new(self.txs, vec![i, j, k], gas_total, utility));
                    if row.len() >= limit {
                        break 'outer;
                    }
                }
            }
            row
        });
        debug!(
            "generated {} triple candidates (truncated: {})",
            generation.candidates.len(),
            generation.truncated
        );
        generation
    }

    /// One candidate per working transaction not in `excluded` that fits the
    /// block on its own, scored by its fee.
    pub fn singles(&self, excluded: &HashSet<usize>) -> Generation<'a> {
        let candidates = self
            .working
            .iter()
            .copied()
            .filter(|i| !excluded.contains(i) && self.txs[*i].gas <= self.gas_limit)
            .map(|i| {
                let tx = &self.txs[i];
                Candidate::new(self.txs, vec![i], tx.gas, Utility::single(fee_score(tx)))
            })
            .collect();
        Generation {
            candidates,
            truncated: false,
        }
    }
}

// Runs `row(a, limit)` for each outer index `a` in ascending order, in parallel
// batches, concatenating rows in order. A row never needs more than `limit`
// candidates: one past what is still missing, enough to detect truncation.
fn enumerate<'a, F>(rows: usize, cap: Option<usize>, row: F) -> Generation<'a>
where
    F: Fn(usize, usize) -> Vec<Candidate<'a>> + Sync + Send,
{
    let mut candidates: Vec<Candidate<'a>> = Vec::new();
    let mut truncated = false;
    let mut start = 0;

    while start < rows {
        let end = (start + ROWS_PER_BATCH).min(rows);
        let limit = cap.map_or(usize::MAX, |cap| cap - candidates.len() + 1);

        let batch: Vec<Vec<Candidate<'a>>> = (start..end)
            .into_par_iter()
            .map(|a| row(a, limit))
            .collect();
        for r in batch {
            candidates.extend(r);
        }

        if let Some(cap) = cap {
            if candidates.len() > cap {
                candidates.truncate(cap);
                truncated = true;
                break;
            }
        }
        start = end;
    }

    Generation {
        candidates,
        truncated,
    }
}
