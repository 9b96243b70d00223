//! Newest-first alert store with change subscriptions
//!
//! The store only ever grows at its head. Views register an
//! [`AlertObserver`] and receive one [`StoreChange`] per mutation, in the
//! order the mutations happened.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::alert::Alert;

/// A single mutation of the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    /// Alert inserted at position 0
    pub alert: Alert,
    /// Oldest alert dropped to honor the retention cap, if any
    pub evicted: Option<Alert>,
    /// Store length after the change
    pub len: usize,
}

/// Receives store mutations
///
/// Called synchronously from [`AlertStore::append`]. Observers may read the
/// store but must not append to it from within `on_change`.
pub trait AlertObserver: Send + Sync {
    fn on_change(&self, change: &StoreChange);
}

type SubscriberId = u64;

struct Inner {
    alerts: VecDeque<Alert>,
    max_alerts: Option<usize>,
    observers: Vec<(SubscriberId, Arc<dyn AlertObserver>)>,
    next_id: SubscriberId,
}

struct Shared {
    inner: Mutex<Inner>,
    // Serializes append + notify so observers see changes in store order
    publish: Mutex<()>,
}

/// Thread-safe handle to the alert store
#[derive(Clone)]
pub struct AlertStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for AlertStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner();
        f.debug_struct("AlertStore")
            .field("len", &inner.alerts.len())
            .field("max_alerts", &inner.max_alerts)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AlertStore {
    /// Create an empty store, optionally capped at `max_alerts` entries
    pub fn new(max_alerts: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    alerts: VecDeque::new(),
                    max_alerts,
                    observers: Vec::new(),
                    next_id: 0,
                }),
                publish: Mutex::new(()),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_lock(&self) -> MutexGuard<'_, ()> {
        self.shared
            .publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an alert at the head and notify every subscriber
    pub fn append(&self, alert: Alert) {
        let _publish = self.publish_lock();

        let (change, observers) = {
            let mut inner = self.inner();
            inner.alerts.push_front(alert.clone());
            let evicted = match inner.max_alerts {
                Some(max) if inner.alerts.len() > max => inner.alerts.pop_back(),
                _ => None,
            };
            let change = StoreChange {
                alert,
                evicted,
                len: inner.alerts.len(),
            };
            let observers: Vec<Arc<dyn AlertObserver>> = inner
                .observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect();
            (change, observers)
        };

        if let Some(evicted) = &change.evicted {
            tracing::debug!(
                "Retention cap reached, evicted '{}' alert from {}",
                evicted.event_type,
                evicted.timestamp_utc
            );
        }

        for observer in observers {
            observer.on_change(&change);
        }
    }

    /// Register an observer
    ///
    /// Alerts already in the store are replayed to the observer oldest first
    /// before it starts receiving live changes, so it never misses or
    /// duplicates an alert.
    pub fn subscribe(&self, observer: Arc<dyn AlertObserver>) -> Subscription {
        let _publish = self.publish_lock();

        let (id, existing) = {
            let mut inner = self.inner();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.push((id, Arc::clone(&observer)));
            let existing: Vec<Alert> = inner.alerts.iter().rev().cloned().collect();
            (id, existing)
        };

        for (index, alert) in existing.into_iter().enumerate() {
            observer.on_change(&StoreChange {
                alert,
                evicted: None,
                len: index + 1,
            });
        }

        tracing::debug!("Store observer {} subscribed", id);
        Subscription {
            id,
            store: Arc::downgrade(&self.shared),
        }
    }

    /// All alerts, newest first
    pub fn snapshot(&self) -> Vec<Alert> {
        self.inner().alerts.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().alerts.is_empty()
    }

    /// Number of live subscriptions
    pub fn observer_count(&self) -> usize {
        self.inner().observers.len()
    }
}

/// Registration handle returned by [`AlertStore::subscribe`]
///
/// The observer is removed when this is dropped or explicitly unsubscribed.
#[must_use = "dropping a subscription unsubscribes the observer"]
pub struct Subscription {
    id: SubscriberId,
    store: Weak<Shared>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.store.upgrade() {
            let mut inner = shared.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.observers.retain(|(id, _)| *id != self.id);
            tracing::debug!("Store observer {} unsubscribed", self.id);
        }
    }
}
