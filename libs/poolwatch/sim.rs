//! In-process pool simulation.
//!
//! Backs the monitor binary (and manual experiments) with a pool whose
//! active bin random-walks one bin per tick. Actionable decisions can
//! be fed back via [`SimulatedPoolSource::apply_decision`] to emulate a
//! confirmed transaction, which closes the loop: create → active →
//! (drift) → rebalance → active.

use crate::core::types::{ActiveBin, PoolAddress, PositionSnapshot, WalletAddress};
use crate::core::types::PositionDecision;
use crate::traits::error::Result;
use crate::traits::source::{PoolEvent, PoolStateSource, SubscriptionId};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

struct SimState {
    bin_id: i32,
    x_amount: u64,
    y_amount: u64,
    positions: Vec<PositionSnapshot>,
    subscribers: HashMap<u64, Sender<PoolEvent>>,
    next_subscription: u64,
    rng: u64,
}

/// A deterministic fake pool
///
/// Cheap to clone; clones share the same simulated market, so a test
/// or binary can keep a handle while a manager owns another.
#[derive(Clone)]
pub struct SimulatedPoolSource {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedPoolSource {
    pub fn new(initial_bin: i32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                bin_id: initial_bin,
                x_amount: 500_000_000_000,
                y_amount: 1_000_000_000_000,
                positions: Vec::new(),
                subscribers: HashMap::new(),
                next_subscription: 0,
                rng: 0x9E37_79B9_7F4A_7C15,
            })),
        }
    }

    /// Advance the market one tick; returns the new active bin id
    ///
    /// The bin moves by -1, 0 or +1 (xorshift-driven, so runs are
    /// reproducible) and subscribers are notified when it moves.
    pub fn advance(&self) -> i32 {
        let mut state = self.inner.lock();

        let mut rng = state.rng;
        rng ^= rng << 13;
        rng ^= rng >> 7;
        rng ^= rng << 17;
        state.rng = rng;
        let step = (rng % 3) as i32 - 1;

        if step != 0 {
            let next = state.bin_id.saturating_add(step);
            state.bin_id = next;
            Self::notify(&mut state);
        }
        state.bin_id
    }

    pub fn active_bin_id(&self) -> i32 {
        self.inner.lock().bin_id
    }

    /// Emulate the confirmed transaction for an actionable decision
    pub fn apply_decision(&self, decision: &PositionDecision) {
        let mut state = self.inner.lock();
        match decision {
            PositionDecision::NeedsCreate {
                total_x_amount,
                total_y_amount,
                range,
            } => {
                state.positions = vec![PositionSnapshot {
                    lower_bin_id: range.min_bin_id,
                    upper_bin_id: range.max_bin_id,
                    total_x_amount: *total_x_amount,
                    total_y_amount: *total_y_amount,
                }];
                Self::notify(&mut state);
            }
            PositionDecision::NeedsRebalance { current, range, .. } => {
                state.positions = vec![PositionSnapshot {
                    lower_bin_id: range.min_bin_id,
                    upper_bin_id: range.max_bin_id,
                    total_x_amount: current.total_x_amount,
                    total_y_amount: current.total_y_amount,
                }];
                Self::notify(&mut state);
            }
            PositionDecision::Active { .. } | PositionDecision::Failed { .. } => {}
        }
    }

    fn notify(state: &mut SimState) {
        // Senders whose subscription died are pruned as a side effect
        state
            .subscribers
            .retain(|_, events| events.send(PoolEvent::Changed).is_ok());
    }

    fn price_of(bin_id: i32) -> Decimal {
        // Toy price curve: 20.0000 plus a quarter-cent per bin
        Decimal::new(200_000 + bin_id as i64 * 25, 4)
    }
}

#[async_trait]
impl PoolStateSource for SimulatedPoolSource {
    async fn refresh(&self, _pool: &PoolAddress) -> Result<()> {
        Ok(())
    }

    async fn active_bin(&self, _pool: &PoolAddress) -> Result<ActiveBin> {
        let state = self.inner.lock();
        Ok(ActiveBin {
            bin_id: state.bin_id,
            price: Self::price_of(state.bin_id),
            x_amount: state.x_amount,
            y_amount: state.y_amount,
        })
    }

    async fn user_positions(
        &self,
        _pool: &PoolAddress,
        _owner: &WalletAddress,
    ) -> Result<Vec<PositionSnapshot>> {
        Ok(self.inner.lock().positions.clone())
    }

    async fn subscribe(
        &self,
        _pool: &PoolAddress,
        events: Sender<PoolEvent>,
    ) -> Result<SubscriptionId> {
        let mut state = self.inner.lock();
        let id = state.next_subscription;
        state.next_subscription += 1;
        state.subscribers.insert(id, events);
        Ok(SubscriptionId(id))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.inner.lock().subscribers.remove(&id.0);
        Ok(())
    }
}
