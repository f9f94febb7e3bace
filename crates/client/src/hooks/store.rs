use std::time::Duration;

use dioxus::prelude::*;
use futures_util::StreamExt;

use crate::debounce::Debouncer;
use crate::platform::MaybeSend;
use crate::stores::Store;

/// Mirror `store` into a signal that follows every `set`/`update`.
pub fn use_store<T: Clone + 'static>(store: &Store<T>) -> Signal<T> {
    let mut value = use_signal(|| store.get());
    let store = store.clone();
    use_hook(move || {
        let mut changes = store.changes();
        spawn(async move {
            while let Some(next) = changes.next().await {
                value.set(next);
            }
        });
    });
    value
}

/// Trails `value` by `delay`: the returned signal only takes a value once
/// `value` has stopped changing for that long.
pub fn use_debounced<T>(value: Signal<T>, delay: Duration) -> Signal<T>
where
    T: Clone + MaybeSend + 'static,
{
    let debouncer = use_hook(|| Debouncer::with_initial(value.cloned(), delay));
    let mut settled = use_signal(|| value.cloned());

    let settled_from = debouncer.clone();
    use_hook(move || {
        let mut stream = settled_from.stream();
        spawn(async move {
            while let Some(next) = stream.next().await {
                settled.set(next);
            }
        });
    });

    use_effect(move || debouncer.push(value.cloned()));

    settled
}
