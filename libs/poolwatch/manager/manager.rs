//! The watcher façade consumed by presentation layers.
//!
//! A `PositionManager` is created once per (wallet, pool) pair and owns
//! everything that monitors it: the subscription control loop, the
//! debounce-and-reconcile worker, the published state and the decision
//! feed. When the wallet or pool identity changes, callers build a
//! fresh manager instead of mutating this one in place.

use crate::core::config::WatcherConfig;
use crate::core::reconciler::{ReconcileWorker, Reconciler};
use crate::core::shutdown::RunFlags;
use crate::core::subscription::{SubscriptionContext, SubscriptionEvent};
use crate::core::types::{DecisionRecord, PoolAddress, WalletAddress};
use crate::core::watch_state::{ManagerSnapshot, MetricsSnapshot, SubscriptionStatus, WatchState};
use crate::traits::error::{Result, WatchError};
use crate::traits::reconnect::ReconnectionStrategy;
use crate::traits::source::PoolStateSource;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Task handles and liveness flags for one `start()` cycle
struct RunningTasks {
    flags: RunFlags,
    worker: JoinHandle<()>,
    subscription: JoinHandle<()>,
}

/// Watches one pool for one wallet and publishes position decisions
///
/// Use [`crate::builder()`] to construct one. Lifecycle:
///
/// 1. [`initialize`](Self::initialize) primes the pool handle (idempotent)
/// 2. [`start`](Self::start) spawns the subscription + reconcile tasks
/// 3. consume decisions via [`snapshot`](Self::snapshot) or
///    [`try_recv_decision`](Self::try_recv_decision)
/// 4. [`stop`](Self::stop) tears everything down; no callback fires
///    after it returns
pub struct PositionManager<S: PoolStateSource> {
    source: Arc<S>,
    config: WatcherConfig,
    strategy: Arc<dyn ReconnectionStrategy>,
    external_flag: Option<Arc<AtomicBool>>,
    state: Arc<WatchState>,
    pool: RwLock<Option<PoolAddress>>,
    owner: RwLock<Option<WalletAddress>>,
    trigger_tx: RwLock<Option<Sender<()>>>,
    decision_tx: Sender<DecisionRecord>,
    decision_rx: Receiver<DecisionRecord>,
    event_tx: Sender<SubscriptionEvent>,
    event_rx: Receiver<SubscriptionEvent>,
    runtime: Mutex<Option<RunningTasks>>,
}

impl<S: PoolStateSource> PositionManager<S> {
    pub(crate) fn new(
        source: Arc<S>,
        config: WatcherConfig,
        strategy: Arc<dyn ReconnectionStrategy>,
        external_flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        let (decision_tx, decision_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();

        Self {
            source,
            config,
            strategy,
            external_flag,
            state: Arc::new(WatchState::new()),
            pool: RwLock::new(None),
            owner: RwLock::new(None),
            trigger_tx: RwLock::new(None),
            decision_tx,
            decision_rx,
            event_tx,
            event_rx,
            runtime: Mutex::new(None),
        }
    }

    /// Prime the pool handle by force-syncing the source once
    ///
    /// Idempotent: repeated calls, and calls racing an in-flight
    /// initialization, are no-ops. A failed attempt records the error
    /// and leaves the manager ready for a later retry.
    pub async fn initialize(&self, pool: PoolAddress) -> Result<()> {
        if self.pool.read().is_some() {
            debug!("Pool handle already initialized, skipping");
            return Ok(());
        }
        if !self.state.begin_initializing() {
            debug!("Initialization already in flight, skipping");
            return Ok(());
        }
        // Re-check under the guard: a concurrent call may have finished
        // between our first check and claiming the guard.
        if self.pool.read().is_some() {
            self.state.end_initializing();
            return Ok(());
        }

        info!("Initializing pool handle {}", pool);
        let result = match timeout(self.config.connect_timeout(), self.source.refresh(&pool)).await
        {
            Ok(result) => result,
            Err(_) => Err(WatchError::Timeout(format!("initialize pool {}", pool))),
        };

        let outcome = match result {
            Ok(()) => {
                *self.pool.write() = Some(pool);
                Ok(())
            }
            Err(error) => {
                warn!("Failed to initialize pool {}: {}", pool, error);
                self.state.record_error(error.clone());
                Err(error)
            }
        };

        self.state.end_initializing();
        outcome
    }

    /// Start watching for `owner`
    ///
    /// Requires an initialized pool handle and a non-empty wallet.
    /// A no-op while already running; after `stop()` or a terminal
    /// `Failed` it spawns fresh tasks with a reset attempt counter —
    /// cancelled timers and stale subscription handles are never
    /// resurrected.
    pub fn start(&self, owner: WalletAddress) -> Result<()> {
        if owner.is_empty() {
            return Err(WatchError::WalletUnavailable);
        }
        let pool = self
            .pool
            .read()
            .clone()
            .ok_or(WatchError::PoolUninitialized)?;

        let mut runtime = self.runtime.lock();
        if let Some(tasks) = runtime.as_ref() {
            let stale = self.state.status() == SubscriptionStatus::Failed
                || (tasks.worker.is_finished() && tasks.subscription.is_finished());
            if !stale {
                debug!("Watcher already running, start() is a no-op");
                return Ok(());
            }
            // Leftovers from a dead cycle: make sure they are halted
            // before their replacements spawn.
            tasks.flags.halt();
        }

        info!("Starting watcher for pool {} (owner {})", pool, owner);
        *self.owner.write() = Some(owner.clone());

        let flags = RunFlags::new(self.external_flag.clone());
        let (trigger_tx, trigger_rx) = unbounded();
        *self.trigger_tx.write() = Some(trigger_tx.clone());

        let worker = ReconcileWorker {
            reconciler: Reconciler::new(
                Arc::clone(&self.source),
                pool.clone(),
                owner,
                self.config.clone(),
            ),
            state: Arc::clone(&self.state),
            trigger_rx,
            decision_tx: self.decision_tx.clone(),
            flags: flags.clone(),
        };
        let worker_handle = tokio::spawn(worker.run());

        let context = SubscriptionContext {
            source: Arc::clone(&self.source),
            pool,
            strategy: Arc::clone(&self.strategy),
            state: Arc::clone(&self.state),
            trigger_tx,
            event_tx: self.event_tx.clone(),
            flags: flags.clone(),
            connect_timeout: self.config.connect_timeout(),
            poll_interval: self.config.poll_interval(),
        };
        let subscription_handle = tokio::spawn(context.run());

        *runtime = Some(RunningTasks {
            flags,
            worker: worker_handle,
            subscription: subscription_handle,
        });
        Ok(())
    }

    /// Tear down the current cycle
    ///
    /// Halts the debounce worker first (the pending trigger is
    /// discarded), then the subscription loop (an in-flight backoff
    /// sleep aborts, the live feed is unsubscribed), and awaits both
    /// tasks — no decision or event is delivered after `stop()`
    /// returns. Safe to call repeatedly and from any state.
    pub async fn stop(&self) {
        let tasks = self.runtime.lock().take();
        let Some(tasks) = tasks else {
            debug!("stop() called with no active watcher");
            return;
        };

        info!("Stopping watcher");
        self.state.set_status(SubscriptionStatus::ShuttingDown);
        tasks.flags.halt();
        let _ = tasks.worker.await;
        let _ = tasks.subscription.await;
        *self.trigger_tx.write() = None;
        self.state.set_status(SubscriptionStatus::Idle);
    }

    /// Request a reconciliation cycle outside the feed cadence
    ///
    /// While the watcher runs, the request coalesces through the
    /// debounce stage like any feed notification. Otherwise one inline
    /// cycle executes, reporting missing preconditions (`initialize`
    /// not done, no wallet) as a `Failed` decision instead of touching
    /// the source.
    pub async fn poll_now(&self) {
        let running = {
            self.runtime
                .lock()
                .as_ref()
                .map(|tasks| tasks.flags.is_live() && !tasks.worker.is_finished())
                .unwrap_or(false)
        };
        if running {
            if let Some(trigger_tx) = self.trigger_tx.read().as_ref() {
                if trigger_tx.send(()).is_ok() {
                    return;
                }
            }
        }

        let pool = self.pool.read().clone();
        let owner = self.owner.read().clone();
        let record = match (pool, owner) {
            (None, _) => DecisionRecord::failed(WatchError::PoolUninitialized),
            (Some(_), None) => DecisionRecord::failed(WatchError::WalletUnavailable),
            (Some(pool), Some(owner)) => {
                self.state.metrics.record_reconciliation();
                Reconciler::new(Arc::clone(&self.source), pool, owner, self.config.clone())
                    .reconcile()
                    .await
            }
        };

        self.state.publish_decision(record.clone());
        let _ = self.decision_tx.send(record);
    }

    /// Point-in-time copy of everything the manager publishes
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            decision: self.state.decision(),
            subscription_status: self.state.status(),
            reconnect_attempt: self.state.attempt(),
            last_error: self.state.last_error(),
            is_initializing: self.state.is_initializing(),
        }
    }

    /// Current subscription status
    #[inline]
    pub fn status(&self) -> SubscriptionStatus {
        self.state.status()
    }

    /// Most recently published decision, if any
    pub fn current_decision(&self) -> Option<DecisionRecord> {
        self.state.decision()
    }

    /// Counters for this watcher
    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.metrics.snapshot()
    }

    /// Pool handle, once initialized
    pub fn pool(&self) -> Option<PoolAddress> {
        self.pool.read().clone()
    }

    /// Whether a watch cycle is currently live
    pub fn is_running(&self) -> bool {
        self.runtime
            .lock()
            .as_ref()
            .map(|tasks| tasks.flags.is_live())
            .unwrap_or(false)
    }

    /// Pull the next decision from the feed (non-blocking)
    pub fn try_recv_decision(&self) -> Option<DecisionRecord> {
        self.decision_rx.try_recv().ok()
    }

    /// Pull the next subscription event (non-blocking)
    pub fn try_recv_event(&self) -> Option<SubscriptionEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl<S: PoolStateSource> Drop for PositionManager<S> {
    fn drop(&mut self) {
        // Dropping without stop(): the tasks cannot be joined here, but
        // halting the flags winds them down on their next poll tick.
        if let Some(tasks) = self.runtime.get_mut().take() {
            tasks.flags.halt();
        }
    }
}
