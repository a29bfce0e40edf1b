//! Domain types shared across the watch pipeline.

use crate::traits::error::WatchError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a DLMM pool account (base58)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolAddress(String);

impl PoolAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of the position owner's wallet (base58)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the bin a pool currently trades in
///
/// Immutable once read; every reconciliation cycle fetches a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBin {
    /// Discrete price bucket id
    pub bin_id: i32,
    /// Spot price of the bin
    pub price: Decimal,
    /// X-token liquidity in the bin (base units)
    pub x_amount: u64,
    /// Y-token liquidity in the bin (base units)
    pub y_amount: u64,
}

/// Inclusive span of bins a position covers
///
/// Invariant: `min_bin_id <= max_bin_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRange {
    pub min_bin_id: i32,
    pub max_bin_id: i32,
}

impl BinRange {
    /// Containment is inclusive on both ends: a position whose boundary
    /// bin is the active bin is still in range.
    pub fn contains(&self, bin_id: i32) -> bool {
        self.min_bin_id <= bin_id && bin_id <= self.max_bin_id
    }

    /// Number of bins covered by the range
    pub fn width(&self) -> u32 {
        self.max_bin_id.abs_diff(self.min_bin_id) + 1
    }
}

impl fmt::Display for BinRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min_bin_id, self.max_bin_id)
    }
}

/// The caller's existing on-chain position for a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
    /// Total X-token liquidity deposited (base units)
    pub total_x_amount: u64,
    /// Total Y-token liquidity deposited (base units)
    pub total_y_amount: u64,
}

impl PositionSnapshot {
    pub fn range(&self) -> BinRange {
        BinRange {
            min_bin_id: self.lower_bin_id,
            max_bin_id: self.upper_bin_id,
        }
    }

    /// Combined liquidity across both sides, widened so the sum cannot wrap
    pub fn total_liquidity(&self) -> u128 {
        self.total_x_amount as u128 + self.total_y_amount as u128
    }
}

/// What should happen to the caller's position, decided per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionDecision {
    /// No position exists; open one over `range` with the given deposit
    NeedsCreate {
        total_x_amount: u64,
        total_y_amount: u64,
        range: BinRange,
    },
    /// The market moved outside the current position's range
    NeedsRebalance {
        current: PositionSnapshot,
        current_liquidity: u128,
        range: BinRange,
    },
    /// The existing position still covers the active bin
    ///
    /// Reports the position's OWN range: while it is still valid, the
    /// on-chain range is authoritative, not a freshly computed one.
    Active { range: BinRange },
    /// This cycle could not produce a decision
    Failed { reason: WatchError },
}

impl PositionDecision {
    /// Whether acting on this decision requires a transaction
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            PositionDecision::NeedsCreate { .. } | PositionDecision::NeedsRebalance { .. }
        )
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PositionDecision::NeedsCreate { .. } => "create",
            PositionDecision::NeedsRebalance { .. } => "rebalance",
            PositionDecision::Active { .. } => "active",
            PositionDecision::Failed { .. } => "failed",
        }
    }
}

/// A published decision together with the snapshot it was made from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: PositionDecision,
    /// The active bin the decision was made against (None on failures)
    pub active_bin: Option<ActiveBin>,
    pub decided_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub(crate) fn new(decision: PositionDecision, active_bin: Option<ActiveBin>) -> Self {
        Self {
            decision,
            active_bin,
            decided_at: Utc::now(),
        }
    }

    pub(crate) fn failed(reason: WatchError) -> Self {
        Self::new(PositionDecision::Failed { reason }, None)
    }
}
