use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::api::identity::OwnerId;

/// Client-side query caches a mutation makes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    Jobs,
    Stats,
    Charts,
}

/// Caches affected by any job mutation
pub const JOB_MUTATION_KEYS: [CacheKey; 3] = [CacheKey::Jobs, CacheKey::Stats, CacheKey::Charts];

/// One owner's caches must be refetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub owner: OwnerId,
    pub keys: Vec<CacheKey>,
}

/// In-process fan-out of cache invalidations to connected clients
#[derive(Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<Invalidation>,
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Announce stale caches for `owner`; a no-op when nobody listens
    pub fn publish(&self, owner: &OwnerId, keys: &[CacheKey]) {
        let delivered = self
            .sender
            .send(Invalidation {
                owner: owner.clone(),
                keys: keys.to_vec(),
            })
            .unwrap_or(0);
        debug!("Invalidation for owner={} sent to {} subscribers", owner, delivered);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.sender.subscribe()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(64)
    }
}
