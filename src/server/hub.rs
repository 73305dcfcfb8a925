//! Published-state hub with subscriber fan-out
//!
//! The hub owns the two shared resources of the process: the most recently
//! published snapshot and the set of subscriber channels. Fan-out rides on
//! a tokio broadcast channel; each connection task holds its own receiver,
//! so a dead or slow subscriber never affects the others.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::Snapshot;

/// Snapshots queued per subscriber. At one snapshot per poll cycle a
/// receiver only lags if its connection task is wedged for hours; lagged
/// receivers skip to the newest snapshot.
const FANOUT_CAPACITY: usize = 64;

/// Registry of subscribers plus the current published state
pub struct Hub {
    published: RwLock<Arc<Snapshot>>,
    sender: broadcast::Sender<Arc<Snapshot>>,
    subscribers: AtomicUsize,
}

impl Hub {
    pub fn new(initial: Snapshot) -> Self {
        let (sender, _) = broadcast::channel(FANOUT_CAPACITY);
        Self {
            published: RwLock::new(Arc::new(initial)),
            sender,
            subscribers: AtomicUsize::new(0),
        }
    }

    /// The current published state.
    pub async fn published(&self) -> Arc<Snapshot> {
        self.published.read().await.clone()
    }

    /// Swap the published state and fan the snapshot out to every
    /// subscriber. Send errors only mean there are no subscribers.
    pub async fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);

        // State swap and send happen under the write lock so that
        // subscribe() observes each snapshot exactly once: either as the
        // greeting or as a queued update, never both, never neither.
        let mut published = self.published.write().await;
        *published = snapshot.clone();
        let _ = self.sender.send(snapshot);
    }

    /// Register a subscriber: its greeting snapshot plus the update stream.
    pub async fn subscribe(self: &Arc<Self>) -> Subscription {
        let published = self.published.read().await;
        let updates = self.sender.subscribe();
        let greeting = published.clone();
        drop(published);

        self.subscribers.fetch_add(1, Ordering::Relaxed);
        Subscription {
            greeting,
            updates,
            hub: self.clone(),
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Relaxed)
    }
}

/// One subscriber's view of the hub, deregistered on drop
pub struct Subscription {
    /// The published state at connect time, sent before any updates
    pub greeting: Arc<Snapshot>,
    /// Every snapshot published after registration
    pub updates: broadcast::Receiver<Arc<Snapshot>>,
    hub: Arc<Hub>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.subscribers.fetch_sub(1, Ordering::Relaxed);
    }
}
