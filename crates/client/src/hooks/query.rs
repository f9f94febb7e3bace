use std::future::Future;

use dioxus::prelude::*;
use futures_util::StreamExt;
use teamspace_shared::ApiError;

use crate::hooks::use_app;
use crate::query::{QueryKey, QueryState};

/// Render-ready state of a cached read.
///
/// `read` must go through the cache itself (one of the `queries` bindings),
/// and `key` must be the key it reads. The hook runs `read` on mount, then
/// follows the cache's change feed: patched data is shown without a request,
/// while invalidated or removed entries are read again. Dropping the
/// component stops the loop.
///
/// ```rust,ignore
/// let app = use_app();
/// let projects = app.projects();
/// let state = use_query(ProjectQueries::all_key(), move || {
///     let projects = projects.clone();
///     async move { projects.list().await }
/// });
/// ```
pub fn use_query<T, F, Fut>(key: QueryKey, read: F) -> Signal<QueryState<T>>
where
    T: Clone + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, ApiError>> + 'static,
{
    let cache = use_app().queries().clone();
    let mut state = use_signal(|| QueryState {
        is_loading: true,
        ..cache.state::<T>(&key)
    });

    use_hook(move || {
        let mut changes = cache.changes();
        spawn(async move {
            let mut needs_read = true;
            loop {
                if needs_read {
                    state.write().is_loading = true;
                    let next = match read().await {
                        Ok(data) => QueryState {
                            is_stale: cache.is_stale(&key),
                            ..QueryState::ready(data)
                        },
                        Err(error) => QueryState {
                            error: Some(error),
                            is_loading: false,
                            ..cache.state(&key)
                        },
                    };
                    state.set(next);
                }

                loop {
                    match changes.next().await {
                        Some(changed) if changed == key => break,
                        Some(_) => {}
                        None => return,
                    }
                }

                // Re-read after an invalidation or removal. A failed entry
                // waits for the next invalidation instead of retrying.
                let snapshot = cache.state::<T>(&key);
                let removed = snapshot.data.is_none() && snapshot.error.is_none();
                needs_read = !snapshot.is_loading && (snapshot.is_stale || removed);
                if !needs_read {
                    state.set(snapshot);
                }
            }
        });
    });

    state
}
