//! Core components of the watch pipeline: domain types, range math,
//! debouncing, the subscription state machine and the reconciler.

pub mod config;
pub mod debounce;
pub mod range;
pub mod reconciler;
pub mod shutdown;
pub mod subscription;
pub mod types;
pub mod watch_state;

// Re-export main types
pub use config::WatcherConfig;
pub use debounce::Debouncer;
pub use range::compute_range;
pub use shutdown::ShutdownManager;
pub use subscription::SubscriptionEvent;
pub use types::{
    ActiveBin, BinRange, DecisionRecord, PoolAddress, PositionDecision, PositionSnapshot,
    WalletAddress,
};
pub use watch_state::{
    AtomicSubscriptionStatus, ManagerSnapshot, MetricsSnapshot, SubscriptionStatus, WatchMetrics,
};
