//! Trailing-edge debouncing for fast-changing input such as search boxes.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use crate::platform::{self, MaybeSend};

struct DebounceInner<T> {
    /// Bumped on every push; only the timer of the latest push may emit.
    generation: u64,
    current: Option<T>,
    listeners: Vec<UnboundedSender<T>>,
}

/// Emits a pushed value once `delay` has passed without another push.
pub struct Debouncer<T> {
    inner: Arc<Mutex<DebounceInner<T>>>,
    delay: Duration,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            delay: self.delay,
        }
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer").field("delay", &self.delay).finish()
    }
}

impl<T: Clone + MaybeSend + 'static> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DebounceInner {
                generation: 0,
                current: None,
                listeners: Vec::new(),
            })),
            delay,
        }
    }

    /// Start with `value` already settled.
    pub fn with_initial(value: T, delay: Duration) -> Self {
        let debouncer = Self::new(delay);
        debouncer.lock().current = Some(value);
        debouncer
    }

    fn lock(&self) -> MutexGuard<'_, DebounceInner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Restart the timer with `value` as the pending value.
    pub fn push(&self, value: T) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.generation
        };

        let this = self.clone();
        platform::spawn(async move {
            platform::sleep(this.delay).await;
            let mut inner = this.lock();
            if inner.generation != generation {
                return;
            }
            inner.current = Some(value.clone());
            inner
                .listeners
                .retain(|tx| tx.unbounded_send(value.clone()).is_ok());
        });
    }

    /// The last value that settled.
    pub fn current(&self) -> Option<T> {
        self.lock().current.clone()
    }

    /// Settled values from now on.
    pub fn stream(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = unbounded();
        self.lock().listeners.push(tx);
        rx
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
