//! Binary runner utilities
//!
//! Configuration loading and logging setup shared by the binaries.

use anyhow::Context;
use poolwatch::WatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initialize tracing with standard configuration
///
/// Honors `RUST_LOG` when set, defaults to `info` otherwise.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Configuration for the rebalance monitor binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pool account to watch
    pub pool_address: String,
    /// Owner wallet (overridable via WALLET_ADDRESS)
    pub wallet_address: String,
    /// Starting bin for the simulated feed
    pub initial_bin: i32,
    /// Milliseconds between simulated market ticks
    pub tick_ms: u64,
    /// Watch-core settings
    pub watcher: WatcherConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // SOL/USDC pool from Meteora
            pool_address: "5rCf1DM8LjKTw4YqhnoLcngyZYeNnQqztScTogYHAS6".to_string(),
            wallet_address: "SimWa11et1111111111111111111111111111111111".to_string(),
            // Center of the DLMM bin id space
            initial_bin: 8_388_608,
            tick_ms: 500,
            watcher: WatcherConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from a yaml file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Parse from a yaml string
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("parsing monitor config yaml")
    }
}
