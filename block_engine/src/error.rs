//! Error types for the block engine.

use thiserror::Error;

/// Errors that abort a block-building run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Two input records carry the same transaction hash
    #[error("duplicate transaction hash {hash} at positions {first} and {second}")]
    DuplicateHash {
        hash: String,
        first: usize,
        second: usize,
    },

    /// Configuration file could not be read or extracted
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Strategy name not recognised
    #[error("unknown strategy {0:?}, expected one of pairwise, hybrid, extended")]
    UnknownStrategy(String),
}

impl From<figment::Error> for EngineError {
    fn from(err: figment::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}
