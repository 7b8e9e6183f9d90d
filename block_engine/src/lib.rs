//! Simulated block construction from a pool of pending transactions.
//!
//! Given a transaction set, a gas budget and an inclusion timestamp, the
//! engine selects the subset that maximises a pairwise utility score while
//! keeping the block under its gas limit and never co-including, through its
//! ranked passes, two transactions that share a sender or destination.
//!
//! ```no_run
//! use block_engine::{build_block, simulated_timestamp, EngineConfig, Strategy};
//! # fn run(txs: Vec<block_engine::Transaction>) -> Result<(), block_engine::EngineError> {
//! let config = EngineConfig::default();
//! let at = simulated_timestamp(&txs, config.delay_ms);
//! let block = build_block(&txs, at, &config, Strategy::ExtendedHybrid)?;
//! println!("{} transactions included", block.summary.included);
//! # Ok(())
//! # }
//! ```

pub mod candidate;
pub mod config;
pub mod error;
pub mod fill;
pub mod packer;
pub mod pipeline;
pub mod prefilter;
pub mod summary;
pub mod transaction;
pub mod utility;

pub use config::{EngineConfig, Weights};
pub use error::EngineError;
pub use pipeline::{build_block, BuiltBlock, Plan, RunStats, Strategy};
pub use summary::Summary;
pub use transaction::{simulated_timestamp, Transaction};
