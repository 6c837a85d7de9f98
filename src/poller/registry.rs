use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

pub type SubscriberId = u64;

#[derive(Default)]
struct Subscribers {
    next_id: SubscriberId,
    entries: HashMap<SubscriberId, Arc<Notify>>,
}

/// Process-wide set of mounted pollers that can be asked to re-fetch
/// immediately. Every registered poller is signalled by `refresh_now`.
#[derive(Clone, Default)]
pub struct RefreshRegistry {
    inner: Arc<Mutex<Subscribers>>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // No invariant spans a panic here, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> (SubscriberId, Arc<Notify>) {
        let mut subs = self.lock();
        subs.next_id += 1;
        let id = subs.next_id;
        let notify = Arc::new(Notify::new());
        subs.entries.insert(id, notify.clone());
        tracing::debug!("Refresh subscriber {} registered", id);
        (id, notify)
    }

    /// Removes one subscriber. Other subscribers are never affected.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().entries.remove(&id).is_some();
        if removed {
            tracing::debug!("Refresh subscriber {} removed", id);
        }
        removed
    }

    /// Fire-and-forget: signals every registered subscriber and returns how
    /// many were signalled. Signals sent while a subscriber is busy coalesce
    /// into one follow-up fetch.
    pub fn refresh_now(&self) -> usize {
        let targets: Vec<Arc<Notify>> = self.lock().entries.values().cloned().collect();
        if targets.is_empty() {
            tracing::warn!("refresh_now(): no mounted pollers");
            return 0;
        }
        for notify in &targets {
            notify.notify_one();
        }
        targets.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
