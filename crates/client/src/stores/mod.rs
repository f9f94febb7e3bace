//! Client-side state that is not server data.
//!
//! Each store is a [`Store<T>`] owned by the application context rather than a
//! global, so tests and multiple app instances do not share state.

mod auth;
mod chat;
mod ui;

use std::sync::{Arc, Mutex, MutexGuard};

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

pub use auth::AuthStore;
pub use chat::ChatStore;
pub use ui::{Theme, UiPreferences, UiStore, UI_STORAGE_KEY};

struct StoreInner<T> {
    value: T,
    listeners: Vec<UnboundedSender<T>>,
}

/// Shared observable value. Clones see the same value.
pub struct Store<T> {
    inner: Arc<Mutex<StoreInner<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Store<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Default + Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Store").field(&self.lock().value).finish()
    }
}

impl<T> Store<T> {
    fn lock(&self) -> MutexGuard<'_, StoreInner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                value,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Replace the value and notify listeners.
    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Modify the value in place and notify listeners.
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        let mut inner = self.lock();
        f(&mut inner.value);
        let value = inner.value.clone();
        inner
            .listeners
            .retain(|tx| tx.unbounded_send(value.clone()).is_ok());
    }

    /// Stream of values written after this call.
    pub fn changes(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = unbounded();
        self.lock().listeners.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_value() {
        let store = Store::new(1);
        let other = store.clone();
        other.set(2);
        assert_eq!(store.get(), 2);
        assert_eq!(store, other);
    }

    #[test]
    fn changes_receive_every_write() {
        let store = Store::new(Vec::<u8>::new());
        let mut rx = store.changes();
        store.update(|v| v.push(1));
        store.set(vec![7]);

        assert_eq!(rx.try_next().unwrap(), Some(vec![1]));
        assert_eq!(rx.try_next().unwrap(), Some(vec![7]));
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let store = Store::new(0);
        drop(store.changes());
        store.set(1);
        assert!(store.lock().listeners.is_empty());
    }
}
