//! Engine configuration.
//!
//! Every run is parameterised by an [`EngineConfig`]; the penalty/bonus
//! [`Weights`] travel inside it and are handed to every utility evaluation.

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;
pub const DEFAULT_MAX_TRIOS: usize = 10_000;
pub const DEFAULT_MAX_PARES: usize = 20_000;
pub const DEFAULT_DELAY_MS: i64 = 6_000;
pub const DEFAULT_WORKING_SET_CAP: usize = 1_000;

/// Penalty and bonus weights of the pairwise utility function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Same sender with the same nonce, or same destination
    pub conflict_penalty: i64,
    /// Combined gas of the pair exceeds the block limit
    pub gas_excess_penalty: i64,
    /// Both transactions target the same destination
    pub common_destination_bonus: i64,
    /// Same sender with consecutive nonces in order
    pub ordered_nonce_bonus: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            conflict_penalty: 999,
            gas_excess_penalty: 10,
            common_destination_bonus: 50,
            ordered_nonce_bonus: 30,
        }
    }
}

/// Per-run configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gas capacity of the simulated block
    pub gas_limit: u64,
    /// Size of the fee-ranked pre-filter; `None` uses the strategy's default
    pub top_n: Option<usize>,
    /// Cap on generated triple candidates
    pub max_trios: usize,
    /// Cap on generated pair candidates (hybrid strategies)
    pub max_pares: usize,
    /// Offset added to the mean arrival time to obtain the block timestamp
    pub delay_ms: i64,
    /// Upper bound on the extended working set (top-N plus related)
    pub working_set_cap: usize,
    pub weights: Weights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            top_n: None,
            max_trios: DEFAULT_MAX_TRIOS,
            max_pares: DEFAULT_MAX_PARES,
            delay_ms: DEFAULT_DELAY_MS,
            working_set_cap: DEFAULT_WORKING_SET_CAP,
            weights: Weights::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Values are read from the `[engine]` table; absent keys keep their
    /// defaults. Environment variables prefixed with `BLOCK_` override file
    /// values, `__` separating nested keys:
    ///
    /// ```toml
    /// [engine]
    /// gas_limit = 30000000
    /// top_n = 300
    ///
    /// [engine.weights]
    /// conflict_penalty = 999
    /// ```
    ///
    /// `BLOCK_ENGINE__GAS_LIMIT=15000000` overrides `gas_limit` above.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();

        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Figment::new().merge(Toml::file(path)),
            Some(ext) => {
                return Err(EngineError::Config(format!(
                    "unsupported config file format: {ext}, use .toml"
                )))
            }
            None => {
                return Err(EngineError::Config(
                    "config file must have a .toml extension".to_string(),
                ))
            }
        };

        let config = figment
            .merge(Env::prefixed("BLOCK_").split("__"))
            .focus("engine")
            .extract()?;

        Ok(config)
    }
}
