//! Error types for analysis runs

use nyaya_domain::{RunId, RunState};
use nyaya_store::StoreError;
use thiserror::Error;

/// Errors that can occur during an analysis run
#[derive(Error, Debug)]
pub enum EngineError {
    /// Unknown Framework, Article or Document id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Engine configuration or knowledge base violates an invariant
    #[error("Invalid configuration: {}", .0.join("; "))]
    ConfigurationInvalid(Vec<String>),

    /// Run state machine violation
    #[error("Invalid run transition: {from} -> {to}")]
    InvalidTransition {
        /// State the run was in
        from: RunState,
        /// Requested state
        to: RunState,
    },

    /// The run was cancelled before reaching `Final`
    #[error("Analysis run {0} cancelled")]
    Cancelled(RunId),

    /// Configuration file could not be parsed or written
    #[error("Config parse error: {0}")]
    Parse(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other storage error
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            StoreError::InvalidQuery(what) => EngineError::InvalidQuery(what),
            StoreError::ConfigurationInvalid(errors) => EngineError::ConfigurationInvalid(errors),
            other => EngineError::Store(other),
        }
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
