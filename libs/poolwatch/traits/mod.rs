//! # PoolWatch Traits
//!
//! Core traits and types for the poolwatch library:
//!
//! - **PoolStateSource**: the capability contract a pool-state backend
//!   must provide (fetches + change subscription)
//! - **ReconnectionStrategy**: control over retry pacing and budgets
//! - **WatchError**: the error taxonomy every component reports through

pub mod error;
pub mod reconnect;
pub mod source;

// Re-export commonly used types
pub use error::{Result, WatchError};
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use source::{PoolEvent, PoolStateSource, SubscriptionId};
