//! Watcher configuration and its defaults.

use crate::traits::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a position watcher
///
/// Durations are plain millisecond fields so the struct deserializes
/// cleanly from config files; accessor methods hand out `Duration`s.
/// `Default` carries the monitor's production settings: ±10 bins,
/// 100 whole X tokens (9 decimals), 1 s debounce, 5 s retry delay,
/// 5 connect attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Bins on each side of the active bin a position should cover
    pub half_width: u16,
    /// X-token deposit for newly created positions (base units)
    pub deposit_x: u64,
    /// Quiet period for coalescing change notifications
    pub debounce_ms: u64,
    /// Delay between reconnect attempts
    pub reconnect_delay_ms: u64,
    /// Total connect attempts per start() cycle, the initial one included
    pub max_reconnect_attempts: usize,
    /// Deadline for subscribe/unsubscribe calls
    pub connect_timeout_ms: u64,
    /// Deadline for each individual state fetch
    pub fetch_timeout_ms: u64,
    /// Granularity of the worker poll loops
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            half_width: 10,
            deposit_x: 100 * 10u64.pow(9),
            debounce_ms: 1_000,
            reconnect_delay_ms: 5_000,
            max_reconnect_attempts: 5,
            connect_timeout_ms: 10_000,
            fetch_timeout_ms: 10_000,
            poll_interval_ms: 25,
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject configurations the worker loops cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(WatchError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.fetch_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(WatchError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.max_reconnect_attempts == 0 {
            return Err(WatchError::Configuration(
                "max_reconnect_attempts must allow at least the initial attempt".to_string(),
            ));
        }
        Ok(())
    }
}
