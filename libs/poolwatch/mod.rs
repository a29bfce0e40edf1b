//! # PoolWatch
//!
//! A resilient watcher for DLMM-style liquidity pools: it keeps a
//! pool-state subscription alive across drops and flaky backends, and
//! turns each (debounced) change notification into a position decision
//! — create, rebalance, or leave alone.
//!
//! ## Design
//!
//! - **Capability injection**: the core never talks to a chain; it
//!   consumes any [`PoolStateSource`] implementation
//! - **One worker pair per watcher**: reconciliations are strictly
//!   sequential, decisions never publish out of freshness order
//! - **Local recovery**: connect failures and stream drops back off and
//!   retry inside the subscription loop; fetch failures cost one cycle
//! - **Lock-free reads**: status and counters are atomics, so polling
//!   the published state never contends with the control loops
//!
//! ## Example
//!
//! ```rust,ignore
//! use poolwatch::{PoolAddress, WalletAddress};
//!
//! #[tokio::main]
//! async fn main() -> poolwatch::Result<()> {
//!     let manager = poolwatch::builder()
//!         .source(my_pool_source)
//!         .build()?;
//!
//!     manager.initialize(PoolAddress::new("5rCf1DM8...")).await?;
//!     manager.start(WalletAddress::new("9xQeWvG8..."))?;
//!
//!     while let Some(record) = manager.try_recv_decision() {
//!         println!("{:?}", record.decision);
//!     }
//!
//!     manager.stop().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod manager;
pub mod sim;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    compute_range, ActiveBin, AtomicSubscriptionStatus, BinRange, Debouncer, DecisionRecord,
    ManagerSnapshot, MetricsSnapshot, PoolAddress, PositionDecision, PositionSnapshot,
    ShutdownManager, SubscriptionEvent, SubscriptionStatus, WalletAddress, WatchMetrics,
    WatcherConfig,
};

// Re-export manager
pub use manager::{NoSource, PositionManager, WatcherBuilder};

// Re-export the simulated source for demos
pub use sim::SimulatedPoolSource;

// Re-export the decimal type used for bin prices
pub use rust_decimal::Decimal;

/// Create a new watcher builder
///
/// Convenience entry point for the builder pattern:
///
/// ```rust,ignore
/// let manager = poolwatch::builder()
///     .source(source)
///     .half_width(10)
///     .build()?;
/// ```
pub fn builder() -> WatcherBuilder<NoSource> {
    WatcherBuilder::new()
}
