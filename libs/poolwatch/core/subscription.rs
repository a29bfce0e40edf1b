//! Subscription lifecycle: connect, detect failure, back off, retry.
//!
//! # Architecture
//!
//! One control-loop task per watcher owns the whole lifecycle:
//!
//! ```text
//! Idle -> Connecting -> Connected -> (Backoff -> Connecting)* -> Failed
//!                          |                                       |
//!                          +----------- stop() ------------> Idle <+
//! ```
//!
//! The loop subscribes, forwards raw change notifications into the
//! debounce stage, and on any failure consults its
//! [`ReconnectionStrategy`] for the next delay. The attempt counter,
//! retry timing and last error are all fields of this one task; nothing
//! here is process-wide, so every (wallet, pool) watcher reconnects
//! independently.
//!
//! A fresh event channel is created for every connect attempt: a sender
//! still held by a dead subscription must never be able to inject
//! events into the live one.

use crate::core::shutdown::{interruptible_sleep, RunFlags};
use crate::core::types::PoolAddress;
use crate::core::watch_state::{SubscriptionStatus, WatchState};
use crate::traits::error::WatchError;
use crate::traits::reconnect::ReconnectionStrategy;
use crate::traits::source::{PoolEvent, PoolStateSource, SubscriptionId};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Status events emitted by the subscription control loop
#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    /// Live feed established
    Connected,
    /// Live feed ended (drop or teardown)
    Disconnected,
    /// Retrying; carries the 0-indexed attempt number
    Reconnecting(usize),
    /// A connect attempt or the stream itself failed
    Error(String),
}

/// Everything the control loop needs, bundled for the spawned task
pub(crate) struct SubscriptionContext<S> {
    pub(crate) source: Arc<S>,
    pub(crate) pool: PoolAddress,
    pub(crate) strategy: Arc<dyn ReconnectionStrategy>,
    pub(crate) state: Arc<WatchState>,
    pub(crate) trigger_tx: Sender<()>,
    pub(crate) event_tx: Sender<SubscriptionEvent>,
    pub(crate) flags: RunFlags,
    pub(crate) connect_timeout: Duration,
    pub(crate) poll_interval: Duration,
}

impl<S: PoolStateSource> SubscriptionContext<S> {
    /// Run the subscription state machine until halted or exhausted
    pub(crate) async fn run(self) {
        // 0-indexed number of the connect attempt about to be made.
        // Reset on every successful subscribe; a fresh start() always
        // begins at 0 because a fresh task is spawned.
        let mut attempt: usize = 0;

        loop {
            if !self.flags.is_live() {
                break;
            }

            self.state.set_status(SubscriptionStatus::Connecting);
            self.state.set_attempt(attempt);
            if attempt > 0 {
                let _ = self
                    .event_tx
                    .send(SubscriptionEvent::Reconnecting(attempt));
                self.state.metrics.record_reconnect();
            }

            let (raw_tx, raw_rx) = unbounded();

            let connected = match timeout(
                self.connect_timeout,
                self.source.subscribe(&self.pool, raw_tx),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(WatchError::Timeout(format!(
                    "subscribe to pool {}",
                    self.pool
                ))),
            };

            match connected {
                Ok(id) => {
                    info!("Subscribed to pool {} (attempt {})", self.pool, attempt);
                    self.state.set_status(SubscriptionStatus::Connected);
                    self.state.set_attempt(0);
                    self.state.clear_error();
                    attempt = 0;
                    let _ = self.event_tx.send(SubscriptionEvent::Connected);

                    // Synthetic change dispatch: the reconciler must run
                    // against current state before any live event lands.
                    let _ = self.trigger_tx.send(());

                    let drop_reason = self.pump_events(&raw_rx).await;

                    self.teardown(id).await;
                    let _ = self.event_tx.send(SubscriptionEvent::Disconnected);

                    match drop_reason {
                        None => break, // halted by the caller
                        Some(reason) => {
                            warn!("Pool feed for {} dropped: {}", self.pool, reason);
                            let error = WatchError::StreamDropped(reason);
                            let _ = self
                                .event_tx
                                .send(SubscriptionEvent::Error(error.to_string()));
                            self.state.record_error(error);
                        }
                    }
                }
                Err(error) => {
                    warn!(
                        "Failed to subscribe to pool {} (attempt {}): {}",
                        self.pool, attempt, error
                    );
                    let _ = self
                        .event_tx
                        .send(SubscriptionEvent::Error(error.to_string()));
                    self.state.record_error(error);
                }
            }

            if !self.flags.is_live() {
                break;
            }

            // Attempt `attempt` just ended in failure; attempt+1 happens
            // only while the strategy still has budget for it.
            match self.strategy.next_delay(attempt) {
                Some(delay) if self.strategy.should_reconnect(attempt + 1) => {
                    debug!(
                        "Reconnecting to pool {} in {:?} (attempt {})",
                        self.pool,
                        delay,
                        attempt + 1
                    );
                    self.state.set_status(SubscriptionStatus::Backoff);
                    if !interruptible_sleep(delay, &self.flags).await {
                        break;
                    }
                    attempt += 1;
                }
                _ => {
                    warn!(
                        "Reconnect budget for pool {} exhausted after {} attempts",
                        self.pool,
                        attempt + 1
                    );
                    self.state.set_status(SubscriptionStatus::Failed);
                    debug!("Subscription task exiting (terminal failure)");
                    return;
                }
            }
        }

        self.state.set_status(SubscriptionStatus::Idle);
        debug!("Subscription task exiting");
    }

    /// Forward raw notifications until the stream drops or we are halted
    ///
    /// Returns `Some(reason)` on a drop, `None` when halted.
    async fn pump_events(&self, raw_rx: &Receiver<PoolEvent>) -> Option<String> {
        loop {
            if !self.flags.is_live() {
                return None;
            }

            loop {
                match raw_rx.try_recv() {
                    Ok(PoolEvent::Changed) => {
                        self.state.metrics.record_notification();
                        if self.trigger_tx.send(()).is_err() {
                            return Some("reconcile trigger channel closed".to_string());
                        }
                    }
                    Ok(PoolEvent::Dropped(reason)) => return Some(reason),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        return Some("event stream disconnected".to_string());
                    }
                }
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Best-effort unsubscribe; failures are logged, never propagated
    async fn teardown(&self, id: SubscriptionId) {
        match timeout(self.connect_timeout, self.source.unsubscribe(id)).await {
            Ok(Ok(())) => debug!("Unsubscribed from pool {}", self.pool),
            Ok(Err(error)) => {
                warn!("Error unsubscribing from pool {}: {}", self.pool, error);
            }
            Err(_) => warn!("Unsubscribe from pool {} timed out", self.pool),
        }
    }
}
