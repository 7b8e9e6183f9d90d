use std::collections::HashSet;

use log::{debug, trace};

use crate::candidate::Candidate;

/// Selection state accumulated while packing a block.
///
/// `gas_used` is always the gas sum over `selected`, and every address in
/// `occupied` belongs to a transaction admitted through [`pack`].
#[derive(Debug, Default, Clone)]
pub struct BlockState<'a> {
    pub selected: HashSet<usize>,
    /// Selected positions in admission order
    pub order: Vec<usize>,
    pub occupied: HashSet<&'a str>,
    pub gas_used: u64,
}

impl<'a> BlockState<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn remaining_gas(&self, gas_limit: u64) -> u64 {
        gas_limit.saturating_sub(self.gas_used)
    }

    /// Whether `gas` more still fits under `gas_limit`.
    pub fn fits(&self, gas: u64, gas_limit: u64) -> bool {
        self.gas_used
            .checked_add(gas)
            .is_some_and(|total| total <= gas_limit)
    }

    // records a transaction without touching the address set
    pub(crate) fn admit(&mut self, position: usize, gas: u64) {
        if self.selected.insert(position) {
            self.order.push(position);
            self.gas_used += gas;
        }
    }
}

/// Outcome counters of one packing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PackStats {
    pub admitted: usize,
    /// A member was already selected
    pub rejected_overlap: usize,
    /// An address was already occupied
    pub rejected_address: usize,
    /// Not enough gas left in the block
    pub rejected_budget: usize,
}

/// Greedily admits `candidates` (already ranked) into `state`.
///
/// A candidate is admitted when none of its members is selected, none of its
/// addresses is occupied and its gas fits the remaining budget. Rejected
/// candidates are never revisited.
pub fn pack<'a>(candidates: &[Candidate<'a>], gas_limit: u64, state: &mut BlockState<'a>) -> PackStats {
    let mut stats = PackStats::default();

    for candidate in candidates {
        if candidate.members.iter().any(|m| state.selected.contains(m)) {
            stats.rejected_overlap += 1;
            continue;
        }
        if candidate.addrs.iter().any(|a| state.occupied.contains(a)) {
            stats.rejected_address += 1;
            continue;
        }
        if !state.fits(candidate.gas_total, gas_limit) {
            stats.rejected_budget += 1;
            continue;
        }

        trace!(
            "admitting {:?} (utility {}, gas {})",
            candidate.members,
            candidate.utility,
            candidate.gas_total
        );
        for &m in &candidate.members {
            state.selected.insert(m);
            state.order.push(m);
        }
        state.gas_used += candidate.gas_total;
        state.occupied.extend(candidate.addrs.iter().copied());
        stats.admitted += 1;
    }

    debug!(
        "packed {} of {} candidates, gas used {}/{} ({:?})",
        stats.admitted,
        candidates.len(),
        state.gas_used,
        gas_limit,
        stats
    );
    stats
}
