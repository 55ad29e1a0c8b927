//! Auth-change observers and their unsubscribe handles.
//!
//! DESIGN
//! ======
//! Delivery is synchronous: `emit` snapshots the observer list, releases the
//! lock, then calls each observer in subscription order. An observer may
//! therefore unsubscribe (or subscribe others) from inside its callback
//! without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::types::AuthChange;

/// Receives every auth-state transition of the client it is subscribed to.
pub trait AuthObserver: Send + Sync {
    fn on_auth_change(&self, change: &AuthChange);
}

impl<F> AuthObserver for F
where
    F: Fn(&AuthChange) + Send + Sync,
{
    fn on_auth_change(&self, change: &AuthChange) {
        self(change);
    }
}

type ObserverList = Vec<(u64, Arc<dyn AuthObserver>)>;

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    observers: Mutex<ObserverList>,
}

/// Fan-out point for auth changes. Cheap to clone; clones share observers.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<RegistryInner>,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It stays registered until the returned handle is
    /// unsubscribed or dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, observer: Arc<dyn AuthObserver>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, observer));
        Subscription { id, registry: Arc::downgrade(&self.inner) }
    }

    /// Deliver `change` to every current observer.
    pub fn emit(&self, change: &AuthChange) {
        let observers: Vec<Arc<dyn AuthObserver>> = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        tracing::debug!(event = change.event.as_str(), observers = observers.len(), "auth change");
        for observer in observers {
            observer.on_auth_change(change);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ObserverList> {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Unsubscribe handle returned by [`ObserverRegistry::subscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Stop delivery to this observer. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(id, _)| *id != self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
