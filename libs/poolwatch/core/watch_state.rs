//! Shared watch state: subscription status, published decisions, metrics.
//!
//! One `WatchState` is owned (via `Arc`) by a single manager and its two
//! worker tasks. Status and counters are atomics so the presentation
//! layer can poll without contending with the control loops; only the
//! decision and error slots take a lock, and never across an await.

use crate::core::types::DecisionRecord;
use crate::traits::error::WatchError;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Lifecycle state of the pool-feed subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Not started, or stopped by the caller
    Idle,
    /// A subscribe call is in flight
    Connecting,
    /// Live feed established
    Connected,
    /// Waiting out the delay before the next connect attempt
    Backoff,
    /// Reconnect budget exhausted; only a fresh `start()` retries
    Failed,
    /// Teardown in progress
    ShuttingDown,
}

impl SubscriptionStatus {
    fn from_usize(value: usize) -> Self {
        match value {
            0 => SubscriptionStatus::Idle,
            1 => SubscriptionStatus::Connecting,
            2 => SubscriptionStatus::Connected,
            3 => SubscriptionStatus::Backoff,
            4 => SubscriptionStatus::Failed,
            _ => SubscriptionStatus::ShuttingDown,
        }
    }

    fn as_usize(self) -> usize {
        match self {
            SubscriptionStatus::Idle => 0,
            SubscriptionStatus::Connecting => 1,
            SubscriptionStatus::Connected => 2,
            SubscriptionStatus::Backoff => 3,
            SubscriptionStatus::Failed => 4,
            SubscriptionStatus::ShuttingDown => 5,
        }
    }

    pub fn is_connected(self) -> bool {
        self == SubscriptionStatus::Connected
    }
}

/// Lock-free status cell
#[derive(Debug)]
pub struct AtomicSubscriptionStatus(AtomicUsize);

impl AtomicSubscriptionStatus {
    pub fn new(status: SubscriptionStatus) -> Self {
        Self(AtomicUsize::new(status.as_usize()))
    }

    #[inline]
    pub fn get(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_usize(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, status: SubscriptionStatus) {
        self.0.store(status.as_usize(), Ordering::Release);
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.get().is_connected()
    }
}

/// Atomic counters for one watcher
#[derive(Debug, Default)]
pub struct WatchMetrics {
    notifications: AtomicU64,
    reconciliations: AtomicU64,
    decisions: AtomicU64,
    reconnects: AtomicU64,
}

impl WatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconciliation(&self) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self) {
        self.decisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            notifications: self.notifications.load(Ordering::Relaxed),
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            decisions: self.decisions.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Raw change notifications received from the feed
    pub notifications: u64,
    /// Reconciliation cycles executed (debounced triggers)
    pub reconciliations: u64,
    /// Decisions published to consumers
    pub decisions: u64,
    /// Reconnect attempts after the initial one
    pub reconnects: u64,
}

/// Everything a manager publishes, shared with its worker tasks
#[derive(Debug)]
pub(crate) struct WatchState {
    status: AtomicSubscriptionStatus,
    attempt: AtomicUsize,
    is_initializing: AtomicBool,
    decision: RwLock<Option<DecisionRecord>>,
    last_error: RwLock<Option<WatchError>>,
    pub(crate) metrics: WatchMetrics,
}

impl WatchState {
    pub(crate) fn new() -> Self {
        Self {
            status: AtomicSubscriptionStatus::new(SubscriptionStatus::Idle),
            attempt: AtomicUsize::new(0),
            is_initializing: AtomicBool::new(false),
            decision: RwLock::new(None),
            last_error: RwLock::new(None),
            metrics: WatchMetrics::new(),
        }
    }

    pub(crate) fn status(&self) -> SubscriptionStatus {
        self.status.get()
    }

    pub(crate) fn set_status(&self, status: SubscriptionStatus) {
        self.status.set(status);
    }

    pub(crate) fn attempt(&self) -> usize {
        self.attempt.load(Ordering::Acquire)
    }

    pub(crate) fn set_attempt(&self, attempt: usize) {
        self.attempt.store(attempt, Ordering::Release);
    }

    /// Claim the initialization guard; false if someone else holds it
    pub(crate) fn begin_initializing(&self) -> bool {
        self.is_initializing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_initializing(&self) {
        self.is_initializing.store(false, Ordering::Release);
    }

    pub(crate) fn is_initializing(&self) -> bool {
        self.is_initializing.load(Ordering::Acquire)
    }

    pub(crate) fn publish_decision(&self, record: DecisionRecord) {
        *self.decision.write() = Some(record);
        self.metrics.record_decision();
    }

    pub(crate) fn decision(&self) -> Option<DecisionRecord> {
        self.decision.read().clone()
    }

    pub(crate) fn record_error(&self, error: WatchError) {
        *self.last_error.write() = Some(error);
    }

    pub(crate) fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    pub(crate) fn last_error(&self) -> Option<WatchError> {
        self.last_error.read().clone()
    }
}

/// What `PositionManager::snapshot()` hands to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerSnapshot {
    pub decision: Option<DecisionRecord>,
    pub subscription_status: SubscriptionStatus,
    /// 0-indexed number of the most recent connect attempt this cycle
    pub reconnect_attempt: usize,
    pub last_error: Option<WatchError>,
    pub is_initializing: bool,
}
