//! Block-building pipeline.
//!
//! All strategies run the same stages, `prefilter -> triples? -> pairs ->
//! singles? -> fill?`; a [`Strategy`] only decides which stages are enabled
//! and with which parameters, through its [`Plan`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use log::{debug, info};

use crate::candidate::Generator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fill::fill;
use crate::packer::{pack, BlockState, PackStats};
use crate::prefilter::{working_set, Prefilter};
use crate::summary::{summarize, Outcome, Summary};
use crate::transaction::Transaction;

pub const HYBRID_TOP_N: usize = 500;
pub const EXTENDED_TOP_N: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Pairs over the full set; the best single transaction when no pair lands
    Pairwise,
    /// Triples then pairs over the top transactions by fee
    Hybrid,
    /// Hybrid over the top transactions and their related ones, topped up by
    /// a fill phase that ignores address exclusivity
    #[default]
    ExtendedHybrid,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pairwise => write!(f, "pairwise"),
            Strategy::Hybrid => write!(f, "hybrid"),
            Strategy::ExtendedHybrid => write!(f, "extended"),
        }
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pairwise" => Ok(Strategy::Pairwise),
            "hybrid" => Ok(Strategy::Hybrid),
            "extended" | "extended-hybrid" => Ok(Strategy::ExtendedHybrid),
            _ => Err(EngineError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Stages enabled for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub prefilter: Prefilter,
    /// Cap on triple candidates, `None` skips the triple pass
    pub triples: Option<usize>,
    /// Cap on pair candidates, `None` for no cap
    pub pair_cap: Option<usize>,
    pub singles_fallback: bool,
    pub fill: bool,
    /// Summary tag identifying the strategy and its parameters
    pub tag: String,
}

impl Strategy {
    pub fn plan(&self, config: &EngineConfig) -> Plan {
        match self {
            Strategy::Pairwise => Plan {
                prefilter: Prefilter::All,
                triples: None,
                pair_cap: None,
                singles_fallback: true,
                fill: false,
                tag: "heuristico".to_string(),
            },
            Strategy::Hybrid => {
                let top_n = config.top_n.unwrap_or(HYBRID_TOP_N);
                Plan {
                    prefilter: Prefilter::TopByFee { top_n },
                    triples: Some(config.max_trios),
                    pair_cap: Some(config.max_pares),
                    singles_fallback: false,
                    fill: false,
                    tag: format!("hibrido_top{top_n}"),
                }
            }
            Strategy::ExtendedHybrid => {
                let top_n = config.top_n.unwrap_or(EXTENDED_TOP_N);
                Plan {
                    prefilter: Prefilter::TopWithRelated {
                        top_n,
                        cap: config.working_set_cap,
                    },
                    triples: Some(config.max_trios),
                    pair_cap: Some(config.max_pares),
                    singles_fallback: false,
                    fill: true,
                    tag: format!("hibrido_extendido_top{top_n}_greedy_agresivo"),
                }
            }
        }
    }
}

/// Per-stage counters of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub triples: PackStats,
    pub pairs: PackStats,
    pub singles: PackStats,
    pub filled: usize,
    pub triples_truncated: bool,
    pub pairs_truncated: bool,
}

/// Result of one block-building run.
#[derive(Debug, Clone)]
pub struct BuiltBlock {
    pub summary: Summary,
    /// Selected positions into the input, in admission order
    pub selected: Vec<usize>,
    pub stats: RunStats,
}

impl BuiltBlock {
    pub fn transactions<'a>(&self, txs: &'a [Transaction]) -> Vec<&'a Transaction> {
        self.selected.iter().map(|&i| &txs[i]).collect()
    }
}

// hash must be unique within a run
fn check_unique_hashes(txs: &[Transaction]) -> Result<(), EngineError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(txs.len());
    for (i, tx) in txs.iter().enumerate() {
        if let Some(&first) = seen.get(tx.hash.as_str()) {
            return Err(EngineError::DuplicateHash {
                hash: tx.hash.clone(),
                first,
                second: i,
            });
        }
        seen.insert(&tx.hash, i);
    }
    Ok(())
}

/// Builds one block from `txs` with `strategy`.
///
/// `simulated_timestamp_ms` is the instant lead times are measured against,
/// see [`crate::transaction::simulated_timestamp`].
pub fn build_block(
    txs: &[Transaction],
    simulated_timestamp_ms: i64,
    config: &EngineConfig,
    strategy: Strategy,
) -> Result<BuiltBlock, EngineError> {
    let start = Instant::now();
    check_unique_hashes(txs)?;

    let plan = strategy.plan(config);
    let gas_limit = config.gas_limit;
    debug!("running {} with {:?}", strategy, plan);

    let working = working_set(txs, plan.prefilter);
    let generator = Generator::new(txs, &working, gas_limit, config.weights);
    let mut state = BlockState::new();
    let mut stats = RunStats::default();

    if let Some(max_trios) = plan.triples {
        let generation = generator.triples(Some(max_trios));
        stats.triples_truncated = generation.truncated;
        stats.triples = pack(&generation.ranked(), gas_limit, &mut state);
    }

    let generation = generator.pairs(&state.selected, plan.pair_cap);
    stats.pairs_truncated = generation.truncated;
    stats.pairs = pack(&generation.ranked(), gas_limit, &mut state);

    if plan.singles_fallback && state.is_empty() {
        let generation = generator.singles(&state.selected);
        stats.singles = pack(&generation.ranked(), gas_limit, &mut state);
    }

    if plan.fill {
        stats.filled = fill(txs, &working, gas_limit, &mut state);
    }

    let summary = summarize(&Outcome {
        algorithm: plan.tag,
        txs,
        selected: &state.order,
        simulated_timestamp_ms,
        gas_limit,
        evaluated: working.len(),
        truncated: stats.triples_truncated || stats.pairs_truncated,
        report_real_utility: plan.fill,
        elapsed: start.elapsed(),
    });

    info!(
        "{}: {} of {} transactions included, gas {}/{}, utility {}",
        summary.algorithm,
        summary.included,
        summary.total_transactions,
        summary.gas_used,
        gas_limit,
        summary.utility_total
    );

    Ok(BuiltBlock {
        summary,
        selected: state.order,
        stats,
    })
}
