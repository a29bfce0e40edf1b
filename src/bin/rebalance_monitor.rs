//! Automated Rebalance Monitor
//!
//! Runs a `PositionManager` over the in-process simulated pool and logs
//! every position decision as a JSON line (ready for a dashboard to
//! ingest). Actionable decisions are fed back into the simulation as if
//! their transaction confirmed, so the loop converges: create → active
//! → (price drifts out of range) → rebalance → active → ...
//!
//! Usage:
//!   cargo run --bin rebalance_monitor
//!
//! Configuration:
//!   - config/rebalancer_config.yaml (override path via CONFIG_PATH)
//!   - WALLET_ADDRESS env var overrides the configured wallet
//!   - RUST_LOG controls verbosity (default: info)

use anyhow::Result;
use dlmm_rebalance_bot::bin_common::{init_tracing, load_config_from_env, ConfigType, MonitorConfig};
use poolwatch::{PoolAddress, ShutdownManager, SimulatedPoolSource, WalletAddress};
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config_path = load_config_from_env(ConfigType::Monitor);
    let config = match MonitorConfig::load(&config_path) {
        Ok(config) => config,
        Err(error) => {
            warn!(
                "Could not load {} ({}); using defaults",
                config_path.display(),
                error
            );
            MonitorConfig::default()
        }
    };

    let wallet = std::env::var("WALLET_ADDRESS").unwrap_or_else(|_| config.wallet_address.clone());

    info!("");
    info!("========================================");
    info!("Starting rebalance monitor");
    info!("Pool:   {}", config.pool_address);
    info!("Wallet: {}", wallet);
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");

    let sim = SimulatedPoolSource::new(config.initial_bin);
    let manager = poolwatch::builder()
        .source(sim.clone())
        .config(config.watcher.clone())
        .build()?;

    manager
        .initialize(PoolAddress::new(config.pool_address.clone()))
        .await?;
    manager.start(WalletAddress::new(wallet))?;

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    while shutdown.is_running() {
        sim.advance();

        while let Some(record) = manager.try_recv_decision() {
            info!("{}", serde_json::to_string(&record)?);
            if record.decision.is_actionable() {
                // Emulate the confirmed transaction so the next cycle
                // sees the repositioned liquidity
                sim.apply_decision(&record.decision);
            }
        }

        shutdown
            .interruptible_sleep(Duration::from_millis(config.tick_ms))
            .await;
    }

    manager.stop().await;

    let metrics = manager.metrics();
    info!("");
    info!("========================================");
    info!("Rebalance monitor stopped gracefully");
    info!(
        "notifications={} cycles={} decisions={} reconnects={}",
        metrics.notifications, metrics.reconciliations, metrics.decisions, metrics.reconnects
    );
    info!("========================================");

    Ok(())
}
