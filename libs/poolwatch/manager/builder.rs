//! Builder for [`PositionManager`].
//!
//! The source is required at the type level: `build()` only exists once
//! `source()` has been called, so a watcher without a backend is a
//! compile error rather than a runtime one. Everything else defaults to
//! the stock settings carried by [`WatcherConfig`].

use crate::core::config::WatcherConfig;
use crate::manager::manager::PositionManager;
use crate::traits::error::Result;
use crate::traits::reconnect::{FixedDelay, ReconnectionStrategy};
use crate::traits::source::PoolStateSource;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Marker: no pool-state source configured yet
pub struct NoSource;

/// Type-state builder for a [`PositionManager`]
///
/// # Example
/// ```ignore
/// let manager = poolwatch::builder()
///     .source(my_source)
///     .half_width(10)
///     .debounce(Duration::from_secs(1))
///     .build()?;
///
/// manager.initialize(pool).await?;
/// manager.start(wallet)?;
/// ```
pub struct WatcherBuilder<S> {
    source: S,
    config: WatcherConfig,
    strategy: Option<Arc<dyn ReconnectionStrategy>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl WatcherBuilder<NoSource> {
    pub fn new() -> Self {
        Self {
            source: NoSource,
            config: WatcherConfig::default(),
            strategy: None,
            shutdown_flag: None,
        }
    }

    /// Set the pool-state backend (required)
    pub fn source<S: PoolStateSource>(self, source: S) -> WatcherBuilder<Arc<S>> {
        WatcherBuilder {
            source: Arc::new(source),
            config: self.config,
            strategy: self.strategy,
            shutdown_flag: self.shutdown_flag,
        }
    }
}

impl Default for WatcherBuilder<NoSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> WatcherBuilder<S> {
    /// Replace the whole configuration
    pub fn config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Bins on each side of the active bin a position should cover
    pub fn half_width(mut self, half_width: u16) -> Self {
        self.config.half_width = half_width;
        self
    }

    /// X-token deposit for newly created positions (base units)
    pub fn deposit_x(mut self, deposit_x: u64) -> Self {
        self.config.deposit_x = deposit_x;
        self
    }

    /// Quiet period for coalescing change notifications
    pub fn debounce(mut self, window: Duration) -> Self {
        self.config.debounce_ms = window.as_millis() as u64;
        self
    }

    /// Override the retry pacing
    ///
    /// Defaults to [`FixedDelay`] built from the config's reconnect
    /// delay and attempt budget.
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Share an externally owned shutdown flag
    ///
    /// When the flag goes false, the watcher's tasks wind down on their
    /// own, letting one flag coordinate shutdown across components.
    pub fn shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

// build() is only available once a source has been set
impl<S: PoolStateSource> WatcherBuilder<Arc<S>> {
    pub fn build(self) -> Result<PositionManager<S>> {
        self.config.validate()?;

        let strategy = self.strategy.unwrap_or_else(|| {
            Arc::new(FixedDelay::new(
                self.config.reconnect_delay(),
                Some(self.config.max_reconnect_attempts),
            ))
        });

        Ok(PositionManager::new(
            self.source,
            self.config,
            strategy,
            self.shutdown_flag,
        ))
    }
}
