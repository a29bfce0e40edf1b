use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for poolwatch
///
/// Variants are `Clone` and serde-friendly because errors travel inside
/// published decisions and across channels, not just up call stacks.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchError {
    /// Initial connect or subscribe to the pool feed failed
    #[error("connection error: {0}")]
    Connection(String),

    /// An established subscription terminated unexpectedly
    #[error("stream dropped: {0}")]
    StreamDropped(String),

    /// Active bin or position fetch failed
    #[error("state fetch error: {0}")]
    StateFetch(String),

    /// A connect or fetch exceeded its deadline
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// No owner wallet address is configured
    #[error("wallet unavailable")]
    WalletUnavailable,

    /// Reconciliation requested before a pool handle exists
    #[error("pool uninitialized")]
    PoolUninitialized,

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for poolwatch operations
pub type Result<T> = std::result::Result<T, WatchError>;
