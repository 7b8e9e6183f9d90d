//! Pairwise utility model.
//!
//! The score of including two transactions together is the sum of their fees
//! adjusted by the bonuses and penalties in [`Weights`]. Larger candidates are
//! scored with the mean of their pairwise scores, kept as an exact fraction in
//! [`Utility`] so ranking never suffers from float rounding.

use std::cmp::Ordering;
use std::fmt;

use crate::config::Weights;
use crate::transaction::Transaction;

/// Fee of `tx` as a score, clamped to `i128::MAX`.
pub fn fee_score(tx: &Transaction) -> i128 {
    i128::try_from(tx.fee()).unwrap_or(i128::MAX)
}

/// Synergy score of including `ti` and `tj` in the same block.
///
/// Rules, evaluated independently:
/// - conflict: same sender with equal nonces (two absent nonces are equal),
///   or same destination
/// - gas excess: combined gas above `gas_limit`
/// - common destination bonus: same destination
/// - ordered nonce bonus: same sender and `tj.nonce == ti.nonce + 1`
///
/// A shared destination therefore triggers the conflict penalty and the
/// common destination bonus at the same time.
pub fn pair_utility(ti: &Transaction, tj: &Transaction, gas_limit: u64, weights: &Weights) -> i128 {
    let same_sender = ti.from == tj.from;
    let same_destination = ti.to == tj.to;

    let nonce_conflict = same_sender && ti.nonce == tj.nonce;
    let gas_excess = ti.gas.checked_add(tj.gas).map_or(true, |gas| gas > gas_limit);
    let ordered = same_sender
        && matches!((ti.nonce, tj.nonce), (Some(a), Some(b)) if a.checked_add(1) == Some(b));

    let mut penalty: i128 = 0;
    let mut bonus: i128 = 0;

    if nonce_conflict || same_destination {
        penalty += weights.conflict_penalty as i128;
    }
    if gas_excess {
        penalty += weights.gas_excess_penalty as i128;
    }
    if same_destination {
        bonus += weights.common_destination_bonus as i128;
    }
    if ordered {
        bonus += weights.ordered_nonce_bonus as i128;
    }

    fee_score(ti)
        .saturating_add(fee_score(tj))
        .saturating_add(bonus)
        .saturating_sub(penalty)
}

/// Exact mean of one or more integer scores.
#[derive(Debug, Clone, Copy)]
pub struct Utility {
    total: i128,
    terms: u32,
}

impl Utility {
    pub fn single(score: i128) -> Self {
        Self { total: score, terms: 1 }
    }

    /// Mean of `scores`; an empty slice scores zero.
    pub fn mean(scores: &[i128]) -> Self {
        if scores.is_empty() {
            return Self::single(0);
        }
        Self {
            total: scores.iter().fold(0i128, |acc, &s| acc.saturating_add(s)),
            terms: scores.len() as u32,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.total as f64 / self.terms as f64
    }
}

impl Ord for Utility {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b vs c/d with b, d > 0: whole parts first, then the remainders
        let (b, d) = (self.terms as i128, other.terms as i128);
        self.total
            .div_euclid(b)
            .cmp(&other.total.div_euclid(d))
            .then_with(|| (self.total.rem_euclid(b) * d).cmp(&(other.total.rem_euclid(d) * b)))
    }
}

impl PartialOrd for Utility {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Utility {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Utility {}

impl fmt::Display for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms == 1 {
            write!(f, "{}", self.total)
        } else {
            write!(f, "{:.3}", self.as_f64())
        }
    }
}
