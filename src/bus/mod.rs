//! Event Bus
//!
//! Topic-based publish/subscribe hub; the only channel components use to
//! talk to each other.
//!
//! # Guarantees
//!
//! - Handlers of one topic run in registration order, synchronously, on the
//!   publishing call.
//! - A panicking handler is caught and logged; the remaining handlers still
//!   receive the event.
//! - Handlers may publish or subscribe re-entrantly: the handler list is
//!   snapshotted before dispatch and no lock is held while handlers run.
//! - Nothing is guaranteed about ordering across topics.

mod event;

pub use event::{Event, FileAction, Topic};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::utils::panic::guard;

/// Event handler callback.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Entry {
    id: SubscriberId,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    handlers: Mutex<FxHashMap<Topic, Vec<Entry>>>,
    next_id: AtomicU64,
    published: AtomicU64,
    failures: AtomicU64,
}

// =============================================================================
// EventBus
// =============================================================================

/// Shared publish/subscribe hub. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// Counters for debug output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BusStats {
    pub published: u64,
    pub handler_failures: u64,
    pub subscribers: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`.
    ///
    /// The returned [`Subscription`] removes exactly this handler when
    /// [`Subscription::unsubscribe`] is called. Dropping it keeps the handler.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .lock()
            .entry(topic)
            .or_default()
            .push(Entry {
                id,
                handler: Arc::new(handler),
            });

        crate::debug!("bus"; "subscribe {} (#{})", topic, id.0);
        Subscription {
            topic,
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every current subscriber of its topic.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        self.inner.published.fetch_add(1, Ordering::Relaxed);

        // Snapshot so handlers can (un)subscribe while we dispatch
        let handlers: Vec<Handler> = match self.inner.handlers.lock().get(&topic) {
            Some(entries) => entries.iter().map(|e| Arc::clone(&e.handler)).collect(),
            None => return,
        };

        for handler in handlers {
            if let Err(panic) = guard(|| handler(&event)) {
                self.inner.failures.fetch_add(1, Ordering::Relaxed);
                crate::log!("bus"; "handler for {} failed: {}", topic, panic);
            }
        }
    }

    /// Remove one handler (`Some(id)`) or every handler (`None`) of a topic.
    ///
    /// Returns the number of handlers removed.
    pub fn unsubscribe(&self, topic: Topic, id: Option<SubscriberId>) -> usize {
        Self::remove(&self.inner, topic, id)
    }

    /// Drop every subscription on every topic.
    pub fn reset(&self) {
        self.inner.handlers.lock().clear();
    }

    /// Number of handlers registered for `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .handlers
            .lock()
            .get(&topic)
            .map_or(0, |entries| entries.len())
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.inner.published.load(Ordering::Relaxed),
            handler_failures: self.inner.failures.load(Ordering::Relaxed),
            subscribers: self.inner.handlers.lock().values().map(Vec::len).sum(),
        }
    }

    fn remove(inner: &BusInner, topic: Topic, id: Option<SubscriberId>) -> usize {
        let mut handlers = inner.handlers.lock();
        let Some(entries) = handlers.get_mut(&topic) else {
            return 0;
        };

        let before = entries.len();
        match id {
            Some(id) => entries.retain(|e| e.id != id),
            None => entries.clear(),
        }
        let removed = before - entries.len();

        if entries.is_empty() {
            handlers.remove(&topic);
        }
        removed
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Handle to one registered handler.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    id: SubscriberId,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the handler. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => EventBus::remove(&inner, self.topic, Some(self.id)) > 0,
            None => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
