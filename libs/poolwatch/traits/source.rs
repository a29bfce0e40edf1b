use crate::core::types::{ActiveBin, PoolAddress, PositionSnapshot, WalletAddress};
use crate::traits::error::Result;
use async_trait::async_trait;
use crossbeam_channel::Sender;

/// Source-issued handle identifying one live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Notification pushed by a pool-state source into a subscriber's channel
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// The pool account changed; subscribers should re-read state
    Changed,
    /// The source lost the feed and will not deliver further events
    /// on this subscription
    Dropped(String),
}

/// Capability contract the watch core requires from its environment
///
/// Implementations wrap whatever transport actually reaches the chain
/// (RPC client, indexer, in-process simulation); the core is agnostic.
/// Fetches may return cached views, which is why [`refresh`] exists:
/// the reconciler force-syncs before every read so decisions come from
/// a snapshot at least as fresh as the notification that triggered them.
///
/// Event delivery: `subscribe` registers a crossbeam `Sender`. Sources
/// push [`PoolEvent::Changed`] on every account change and either push
/// [`PoolEvent::Dropped`] or drop the sender when the feed dies; the
/// subscription loop treats a disconnected channel as a drop.
///
/// [`refresh`]: PoolStateSource::refresh
#[async_trait]
pub trait PoolStateSource: Send + Sync + 'static {
    /// Force-sync the source's cached view of the pool
    async fn refresh(&self, pool: &PoolAddress) -> Result<()>;

    /// Fetch the bin the pool currently trades in
    async fn active_bin(&self, pool: &PoolAddress) -> Result<ActiveBin>;

    /// Fetch the owner's positions for this pool
    ///
    /// The source defines no ordering; callers that need "the" position
    /// take the first element as an explicit policy.
    async fn user_positions(
        &self,
        pool: &PoolAddress,
        owner: &WalletAddress,
    ) -> Result<Vec<PositionSnapshot>>;

    /// Start pushing change notifications for the pool into `events`
    async fn subscribe(
        &self,
        pool: &PoolAddress,
        events: Sender<PoolEvent>,
    ) -> Result<SubscriptionId>;

    /// Stop a live subscription
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;
}
