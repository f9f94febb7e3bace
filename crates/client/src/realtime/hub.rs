//! Fan-out of inbound real-time events to subscribers.
//!
//! Events reaching the hub while nobody is subscribed are held in a bounded
//! buffer and replayed, in arrival order, to the next subscriber.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use teamspace_shared::ServerEvent;

/// Events kept for late subscribers when no one is listening.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

pub type EventCallback = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

struct HubInner {
    subscribers: Vec<(u64, EventCallback)>,
    buffer: VecDeque<ServerEvent>,
    capacity: usize,
    next_id: u64,
    dropped: u64,
}

/// Shared event hub; clones publish to and subscribe on the same hub.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<Mutex<HubInner>>,
    /// Serializes delivery so a replaying subscriber and a concurrent publish
    /// cannot reorder events.
    delivery: Arc<Mutex<()>>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("EventHub")
            .field("subscribers", &inner.subscribers.len())
            .field("buffered", &inner.buffer.len())
            .finish()
    }
}

impl PartialEq for EventHub {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EventHub {
    /// `capacity` bounds the buffer used while nobody is subscribed.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                subscribers: Vec::new(),
                buffer: VecDeque::new(),
                capacity,
                next_id: 0,
                dropped: 0,
            })),
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Register `callback` for every subsequent event. Buffered events are
    /// replayed to it first.
    ///
    /// Delivery stops when the returned [`Subscription`] is dropped. Callbacks
    /// must not publish to the hub they are subscribed on.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let callback: EventCallback = Arc::new(callback);
        let _delivery = lock(&self.delivery);

        let (id, backlog) = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, callback.clone()));
            let backlog: Vec<ServerEvent> = inner.buffer.drain(..).collect();
            (id, backlog)
        };

        if !backlog.is_empty() {
            crate::log_debug!("replaying {} buffered events to subscriber {}", backlog.len(), id);
        }
        for event in &backlog {
            callback(event);
        }

        Subscription {
            hub: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Deliver `event` to every subscriber in registration order, or buffer it
    /// when there are none.
    pub fn publish(&self, event: ServerEvent) {
        let _delivery = lock(&self.delivery);

        let subscribers: Vec<EventCallback> = {
            let mut inner = lock(&self.inner);
            if inner.subscribers.is_empty() {
                if inner.capacity == 0 {
                    inner.dropped += 1;
                    crate::log_warn!("no subscriber for {} event; dropped", event.kind());
                    return;
                }
                if inner.buffer.len() >= inner.capacity {
                    if let Some(oldest) = inner.buffer.pop_front() {
                        inner.dropped += 1;
                        crate::log_warn!(
                            "event buffer full ({}); dropped oldest {} event",
                            inner.capacity,
                            oldest.kind()
                        );
                    }
                }
                inner.buffer.push_back(event);
                return;
            }
            inner.subscribers.iter().map(|(_, cb)| cb.clone()).collect()
        };

        for callback in subscribers {
            callback(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    pub fn buffered(&self) -> usize {
        lock(&self.inner).buffer.len()
    }

    /// Events lost to a full buffer since the hub was created.
    pub fn dropped(&self) -> u64 {
        lock(&self.inner).dropped
    }
}

/// Keeps a hub callback registered while alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    hub: Weak<Mutex<HubInner>>,
    id: u64,
}

impl Subscription {
    /// Keep the callback registered for the hub's whole lifetime.
    pub fn detach(mut self) {
        self.hub = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            lock(&inner).subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
