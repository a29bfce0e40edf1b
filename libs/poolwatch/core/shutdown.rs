//! Graceful shutdown management

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tracing::info;

/// Manages graceful shutdown for long-running processes
pub struct ShutdownManager {
    flag: Arc<AtomicBool>,
}

impl ShutdownManager {
    /// Create a new shutdown manager with running state
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Spawn a Ctrl+C signal handler that triggers shutdown
    pub fn spawn_signal_handler(&self) {
        let flag = Arc::clone(&self.flag);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("");
                info!("Received shutdown signal (Ctrl+C)");
                info!("Shutting down gracefully...");
                flag.store(false, Ordering::Release);
            }
        });
    }

    /// Check if the process should continue running
    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Get a clone of the shutdown flag for passing to async tasks
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Sleep for a duration, but wake early if shutdown is triggered
    pub async fn interruptible_sleep(&self, duration: Duration) {
        let check_interval = Duration::from_millis(50);
        let mut elapsed = Duration::ZERO;

        while elapsed < duration && self.is_running() {
            sleep(check_interval).await;
            elapsed += check_interval;
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Liveness flags for one `start()` cycle
///
/// Worker tasks check two flags: the per-cycle `run` flag (flipped by
/// `stop()`) and an optional externally owned flag for coordinated
/// shutdown across components. A fresh `RunFlags` is created per cycle
/// so restarting a manager can never resurrect a halted task.
#[derive(Debug, Clone)]
pub(crate) struct RunFlags {
    run: Arc<AtomicBool>,
    external: Option<Arc<AtomicBool>>,
}

impl RunFlags {
    pub(crate) fn new(external: Option<Arc<AtomicBool>>) -> Self {
        Self {
            run: Arc::new(AtomicBool::new(true)),
            external,
        }
    }

    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.run.load(Ordering::Acquire)
            && self
                .external
                .as_ref()
                .map_or(true, |flag| flag.load(Ordering::Acquire))
    }

    pub(crate) fn halt(&self) {
        self.run.store(false, Ordering::Release);
    }
}

/// Sleep in short slices, bailing out as soon as the flags go dead
///
/// Returns `true` if the full duration elapsed, `false` on early halt.
pub(crate) async fn interruptible_sleep(duration: Duration, flags: &RunFlags) -> bool {
    let check_interval = Duration::from_millis(100);
    let mut elapsed = Duration::ZERO;

    while elapsed < duration {
        if !flags.is_live() {
            return false;
        }
        let slice = check_interval.min(duration - elapsed);
        sleep(slice).await;
        elapsed += slice;
    }
    flags.is_live()
}
