//! Common test utilities for poolwatch integration tests.
//!
//! Provides a fully scripted [`MockPoolSource`]: tests control the
//! active bin, the position list, and failure injection, and can push
//! change notifications or kill the stream at will.

#![allow(dead_code)]

use async_trait::async_trait;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use poolwatch::{
    ActiveBin, Decimal, PoolAddress, PoolEvent, PoolStateSource, PositionSnapshot, Result,
    SubscriptionId, WalletAddress, WatchError, WatcherConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct MockInner {
    active_bin: Mutex<ActiveBin>,
    positions: Mutex<Vec<PositionSnapshot>>,
    subscribers: Mutex<HashMap<u64, Sender<PoolEvent>>>,
    next_subscription: AtomicU64,
    /// Remaining subscribe calls that should fail
    fail_subscribes: AtomicUsize,
    fail_active_bin: AtomicBool,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    position_fetches: AtomicUsize,
}

/// Scripted pool source; clones share state with the manager's copy
#[derive(Clone)]
pub struct MockPoolSource {
    inner: Arc<MockInner>,
}

impl MockPoolSource {
    pub fn new(bin_id: i32) -> Self {
        Self::with_amounts(bin_id, 500, 1_000)
    }

    pub fn with_amounts(bin_id: i32, x_amount: u64, y_amount: u64) -> Self {
        Self {
            inner: Arc::new(MockInner {
                active_bin: Mutex::new(ActiveBin {
                    bin_id,
                    price: Decimal::new(2025, 2),
                    x_amount,
                    y_amount,
                }),
                positions: Mutex::new(Vec::new()),
                subscribers: Mutex::new(HashMap::new()),
                next_subscription: AtomicU64::new(0),
                fail_subscribes: AtomicUsize::new(0),
                fail_active_bin: AtomicBool::new(false),
                subscribe_calls: AtomicUsize::new(0),
                unsubscribe_calls: AtomicUsize::new(0),
                refresh_calls: AtomicUsize::new(0),
                position_fetches: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_active_bin_id(&self, bin_id: i32) {
        self.inner.active_bin.lock().bin_id = bin_id;
    }

    pub fn set_positions(&self, positions: Vec<PositionSnapshot>) {
        *self.inner.positions.lock() = positions;
    }

    /// Make the next `count` subscribe calls fail
    pub fn fail_next_subscribes(&self, count: usize) {
        self.inner.fail_subscribes.store(count, Ordering::SeqCst);
    }

    pub fn clear_failures(&self) {
        self.inner.fail_subscribes.store(0, Ordering::SeqCst);
        self.inner.fail_active_bin.store(false, Ordering::SeqCst);
    }

    pub fn set_fail_active_bin(&self, fail: bool) {
        self.inner.fail_active_bin.store(fail, Ordering::SeqCst);
    }

    /// Push a change notification to every live subscriber
    pub fn emit_change(&self) {
        self.inner
            .subscribers
            .lock()
            .retain(|_, events| events.send(PoolEvent::Changed).is_ok());
    }

    /// Kill the stream: subscribers get a drop event, then nothing
    pub fn drop_stream(&self, reason: &str) {
        let mut subscribers = self.inner.subscribers.lock();
        for events in subscribers.values() {
            let _ = events.send(PoolEvent::Dropped(reason.to_string()));
        }
        subscribers.clear();
    }

    pub fn subscribe_calls(&self) -> usize {
        self.inner.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.inner.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn position_fetches(&self) -> usize {
        self.inner.position_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolStateSource for MockPoolSource {
    async fn refresh(&self, _pool: &PoolAddress) -> Result<()> {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn active_bin(&self, _pool: &PoolAddress) -> Result<ActiveBin> {
        if self.inner.fail_active_bin.load(Ordering::SeqCst) {
            return Err(WatchError::StateFetch(
                "injected active bin failure".to_string(),
            ));
        }
        Ok(self.inner.active_bin.lock().clone())
    }

    async fn user_positions(
        &self,
        _pool: &PoolAddress,
        _owner: &WalletAddress,
    ) -> Result<Vec<PositionSnapshot>> {
        self.inner.position_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.positions.lock().clone())
    }

    async fn subscribe(
        &self,
        _pool: &PoolAddress,
        events: Sender<PoolEvent>,
    ) -> Result<SubscriptionId> {
        self.inner.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_subscribes.load(Ordering::SeqCst) > 0 {
            self.inner.fail_subscribes.fetch_sub(1, Ordering::SeqCst);
            return Err(WatchError::Connection(
                "injected subscribe failure".to_string(),
            ));
        }
        let id = self.inner.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.lock().insert(id, events);
        Ok(SubscriptionId(id))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.inner.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.lock().remove(&id.0);
        Ok(())
    }
}

/// A snapshot with fixed 600/400 liquidity over the given bin span
pub fn snapshot(lower_bin_id: i32, upper_bin_id: i32) -> PositionSnapshot {
    PositionSnapshot {
        lower_bin_id,
        upper_bin_id,
        total_x_amount: 600,
        total_y_amount: 400,
    }
}

/// Watcher config with intervals shrunk to test scale
pub fn fast_config() -> WatcherConfig {
    WatcherConfig {
        half_width: 10,
        deposit_x: 100,
        debounce_ms: 40,
        reconnect_delay_ms: 40,
        max_reconnect_attempts: 5,
        connect_timeout_ms: 2_000,
        fetch_timeout_ms: 2_000,
        poll_interval_ms: 10,
    }
}

/// Poll `condition` every 10 ms until it holds or `timeout_ms` elapses
pub async fn wait_until(timeout_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
