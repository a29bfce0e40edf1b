//! Position reconciliation: fetch a fresh snapshot, classify, publish.
//!
//! Runs once per debounced trigger on the same worker task that does
//! the debouncing, so reconciliation cycles are strictly sequential: a
//! trigger landing mid-cycle coalesces into the next one instead of
//! starting a concurrent run against the same (wallet, pool) pair.

use crate::core::config::WatcherConfig;
use crate::core::debounce::Debouncer;
use crate::core::range::compute_range;
use crate::core::shutdown::RunFlags;
use crate::core::types::{
    ActiveBin, DecisionRecord, PoolAddress, PositionDecision, WalletAddress,
};
use crate::core::watch_state::WatchState;
use crate::traits::error::{Result, WatchError};
use crate::traits::source::PoolStateSource;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// One reconciliation engine per (wallet, pool) watcher
pub(crate) struct Reconciler<S> {
    source: Arc<S>,
    pool: PoolAddress,
    owner: WalletAddress,
    pub(crate) config: WatcherConfig,
}

impl<S: PoolStateSource> Reconciler<S> {
    pub(crate) fn new(
        source: Arc<S>,
        pool: PoolAddress,
        owner: WalletAddress,
        config: WatcherConfig,
    ) -> Self {
        Self {
            source,
            pool,
            owner,
            config,
        }
    }

    /// Run one cycle; errors become a `Failed` decision, never a panic
    /// or a propagated error, so the subscription outlives bad cycles.
    pub(crate) async fn reconcile(&self) -> DecisionRecord {
        match self.fetch_decision().await {
            Ok((decision, active_bin)) => {
                debug!(
                    "Pool {} bin {}: decision is '{}'",
                    self.pool, active_bin.bin_id, decision.kind()
                );
                DecisionRecord::new(decision, Some(active_bin))
            }
            Err(reason) => {
                warn!("Reconciliation for pool {} failed: {}", self.pool, reason);
                DecisionRecord::failed(reason)
            }
        }
    }

    async fn fetch_decision(&self) -> Result<(PositionDecision, ActiveBin)> {
        let deadline = self.config.fetch_timeout();

        // The source's cached view may be stale relative to the tick
        // that triggered this cycle; force-sync before reading.
        timeout(deadline, self.source.refresh(&self.pool))
            .await
            .map_err(|_| WatchError::Timeout("pool refresh".to_string()))??;

        let active_bin = timeout(deadline, self.source.active_bin(&self.pool))
            .await
            .map_err(|_| WatchError::Timeout("active bin fetch".to_string()))??;

        let target = compute_range(active_bin.bin_id, self.config.half_width);

        let positions = timeout(deadline, self.source.user_positions(&self.pool, &self.owner))
            .await
            .map_err(|_| WatchError::Timeout("position fetch".to_string()))??;

        if positions.len() > 1 {
            warn!(
                "{} positions returned for wallet {} on pool {}, using the first",
                positions.len(),
                self.owner,
                self.pool
            );
        }

        let decision = match positions.into_iter().next() {
            None => {
                let (total_x_amount, total_y_amount) =
                    size_deposit(&active_bin, self.config.deposit_x)?;
                PositionDecision::NeedsCreate {
                    total_x_amount,
                    total_y_amount,
                    range: target,
                }
            }
            Some(snapshot) => {
                let held = snapshot.range();
                if held.contains(active_bin.bin_id) {
                    // Still in range: the on-chain range stays
                    // authoritative, not the freshly computed one.
                    PositionDecision::Active { range: held }
                } else {
                    PositionDecision::NeedsRebalance {
                        current_liquidity: snapshot.total_liquidity(),
                        current: snapshot,
                        range: target,
                    }
                }
            }
        };

        Ok((decision, active_bin))
    }
}

/// Price-proportional sizing for a new position: the Y deposit mirrors
/// the active bin's X:Y ratio applied to the configured X deposit.
fn size_deposit(active_bin: &ActiveBin, deposit_x: u64) -> Result<(u64, u64)> {
    if active_bin.y_amount == 0 {
        return Err(WatchError::StateFetch(
            "active bin has no Y liquidity to size against".to_string(),
        ));
    }

    let y = (active_bin.x_amount as u128) * (deposit_x as u128) / (active_bin.y_amount as u128);
    let y = u64::try_from(y)
        .map_err(|_| WatchError::StateFetch("sized Y deposit exceeds u64 range".to_string()))?;

    Ok((deposit_x, y))
}

/// The debounce-and-reconcile worker task
///
/// Owns the trigger receiver for one `start()` cycle. Raw triggers are
/// coalesced by the [`Debouncer`]; each released trigger runs exactly
/// one reconciliation, and the resulting record is published only while
/// the cycle is still live, so no decision surfaces after `stop()`.
pub(crate) struct ReconcileWorker<S> {
    pub(crate) reconciler: Reconciler<S>,
    pub(crate) state: Arc<WatchState>,
    pub(crate) trigger_rx: Receiver<()>,
    pub(crate) decision_tx: Sender<DecisionRecord>,
    pub(crate) flags: RunFlags,
}

impl<S: PoolStateSource> ReconcileWorker<S> {
    pub(crate) async fn run(self) {
        let mut debouncer = Debouncer::new(self.reconciler.config.debounce());
        let poll = self.reconciler.config.poll_interval();
        debug!("Reconcile worker started");

        loop {
            if !self.flags.is_live() {
                break;
            }

            loop {
                match self.trigger_rx.try_recv() {
                    Ok(()) => debouncer.record(()),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        debug!("Trigger channel closed, reconcile worker exiting");
                        return;
                    }
                }
            }

            if debouncer.poll().is_some() {
                self.state.metrics.record_reconciliation();
                let record = self.reconciler.reconcile().await;

                if !self.flags.is_live() {
                    break;
                }
                self.state.publish_decision(record.clone());
                let _ = self.decision_tx.send(record);
            }

            sleep(poll).await;
        }

        debug!("Reconcile worker exiting");
    }
}
