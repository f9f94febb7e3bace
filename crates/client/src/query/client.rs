use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::future::{FutureExt, Shared};
use teamspace_shared::ApiError;

use super::{QueryKey, QueryState};
use crate::platform::{boxed, BoxFuture, MaybeSend};

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, ApiError>>>;

struct InFlight {
    id: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct Entry {
    data: Option<AnyValue>,
    error: Option<ApiError>,
    stale: bool,
    updated_at: Option<DateTime<Utc>>,
    in_flight: Option<InFlight>,
    /// Bumped by every invalidation; a fetch that started under an older
    /// generation stores its result as stale.
    generation: u64,
    /// Id of the newest fetch whose result has been written.
    settled: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<QueryKey, Entry>,
    listeners: Vec<UnboundedSender<QueryKey>>,
    next_fetch: u64,
}

impl Inner {
    fn notify(&mut self, key: &QueryKey) {
        self.listeners
            .retain(|tx| tx.unbounded_send(key.clone()).is_ok());
    }
}

/// Process-wide query cache. Clones share the same cache.
#[derive(Clone, Default)]
pub struct QueryClient {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("QueryClient")
            .field("entries", &inner.entries.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl PartialEq for QueryClient {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn downcast<T: Clone + 'static>(value: &AnyValue) -> Option<T> {
    value.downcast_ref::<T>().cloned()
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read through the cache.
    ///
    /// Fresh data is returned without a request. Otherwise the caller joins
    /// the request already in flight for `key`, or starts one with `fetcher`.
    pub async fn fetch_query<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + MaybeSend + 'static,
    {
        let (fetch_id, generation, future) = {
            let mut inner = self.lock();
            let fetch_id = inner.next_fetch + 1;
            let entry = inner.entries.entry(key.clone()).or_default();

            if !entry.stale {
                if let Some(data) = entry.data.as_ref().and_then(downcast::<T>) {
                    return Ok(data);
                }
            }

            let joined = entry
                .in_flight
                .as_ref()
                .map(|in_flight| (in_flight.id, in_flight.future.clone()));
            match joined {
                Some((id, future)) => (id, entry.generation, future),
                None => {
                    let request = fetcher();
                    let future = boxed(async move {
                        request.await.map(|data| Arc::new(data) as AnyValue)
                    })
                    .shared();
                    entry.in_flight = Some(InFlight {
                        id: fetch_id,
                        future: future.clone(),
                    });
                    let generation = entry.generation;
                    inner.next_fetch = fetch_id;
                    inner.notify(key);
                    crate::log_debug!("query {} fetching (#{})", key, fetch_id);
                    (fetch_id, generation, future)
                }
            }
        };

        let result = future.await;
        self.settle(key, fetch_id, generation, &result);

        let data = result?;
        downcast::<T>(&data).ok_or_else(|| {
            ApiError::Malformed(format!("cached value for {key} has an unexpected type"))
        })
    }

    fn settle(
        &self,
        key: &QueryKey,
        fetch_id: u64,
        generation: u64,
        result: &Result<AnyValue, ApiError>,
    ) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            // Removed while in flight.
            return;
        };

        if entry.in_flight.as_ref().is_some_and(|f| f.id == fetch_id) {
            entry.in_flight = None;
        }
        // Every waiter on a shared fetch settles; only the first one writes.
        if fetch_id <= entry.settled {
            return;
        }
        // A newer request has started since; let it write.
        if entry.in_flight.as_ref().is_some_and(|f| f.id > fetch_id) {
            return;
        }

        entry.settled = fetch_id;
        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.error = None;
                entry.stale = entry.generation != generation;
                entry.updated_at = Some(Utc::now());
            }
            Err(e) => {
                crate::log_warn!("query {} failed: {}", key, e);
                entry.error = Some(e.clone());
            }
        }
        inner.notify(key);
    }

    /// Read through the cache and report the outcome as a [`QueryState`].
    ///
    /// On failure the previous data, if any, is kept alongside the error.
    pub async fn query<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryState<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + MaybeSend + 'static,
    {
        match self.fetch_query(key, fetcher).await {
            Ok(data) => QueryState {
                is_stale: self.is_stale(key),
                ..QueryState::ready(data)
            },
            Err(error) => QueryState {
                error: Some(error),
                is_loading: false,
                ..self.state(key)
            },
        }
    }

    /// Current snapshot of `key` without fetching.
    pub fn state<T: Clone + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) => QueryState {
                data: entry.data.as_ref().and_then(downcast::<T>),
                is_loading: entry.in_flight.is_some(),
                error: entry.error.clone(),
                is_stale: entry.stale,
            },
            None => QueryState::idle(),
        }
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock().entries.get(key).is_some_and(|e| e.stale)
    }

    /// When `key` last received server data.
    pub fn updated_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.lock().entries.get(key).and_then(|e| e.updated_at)
    }

    /// Cached data for `key`, fresh or stale.
    pub fn get_query_data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.lock()
            .entries
            .get(key)
            .and_then(|e| e.data.as_ref())
            .and_then(downcast::<T>)
    }

    /// Seed or overwrite `key` with `data`, marking it fresh.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, data: T) {
        let mut inner = self.lock();
        let entry = inner.entries.entry(key.clone()).or_default();
        entry.data = Some(Arc::new(data) as AnyValue);
        entry.error = None;
        entry.stale = false;
        entry.updated_at = Some(Utc::now());
        inner.notify(key);
    }

    /// Patch cached data in place. Returns `false` (and does nothing) when
    /// `key` holds no data of type `T`.
    ///
    /// `patch` runs while the cache is locked and must not call back into
    /// this client.
    pub fn update_query_data<T, F>(&self, key: &QueryKey, patch: F) -> bool
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            return false;
        };
        let Some(mut data) = entry.data.as_ref().and_then(downcast::<T>) else {
            return false;
        };
        patch(&mut data);
        entry.data = Some(Arc::new(data) as AnyValue);
        inner.notify(key);
        true
    }

    /// Mark every entry under `prefix` stale. Requests already in flight are
    /// detached: their waiters still get a result, but it is stored as stale
    /// and the next read starts a new request.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut inner = self.lock();
        let mut touched = Vec::new();
        for (key, entry) in inner.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                entry.generation += 1;
                entry.in_flight = None;
                touched.push(key.clone());
            }
        }
        crate::log_debug!("invalidated {} entries under {}", touched.len(), prefix);
        for key in &touched {
            inner.notify(key);
        }
    }

    /// Run a mutation; on success invalidate each prefix in `invalidates`.
    /// On failure the error is returned and the cache is left untouched.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, invalidates: &[QueryKey]) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let output = mutation.await?;
        for prefix in invalidates {
            self.invalidate(prefix);
        }
        Ok(output)
    }

    /// Drop every entry under `prefix`.
    pub fn remove(&self, prefix: &QueryKey) {
        let mut inner = self.lock();
        let removed: Vec<QueryKey> = inner
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &removed {
            inner.entries.remove(key);
            inner.notify(key);
        }
    }

    /// Drop everything (logout).
    pub fn clear(&self) {
        let mut inner = self.lock();
        let keys: Vec<QueryKey> = inner.entries.drain().map(|(key, _)| key).collect();
        for key in &keys {
            inner.notify(key);
        }
    }

    /// Stream of keys whose entry changed (fetched, patched, invalidated or
    /// removed).
    pub fn changes(&self) -> UnboundedReceiver<QueryKey> {
        let (tx, rx) = unbounded();
        self.lock().listeners.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send + 'static {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(vec![value.to_string()])
        }
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_request() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::from(["projects"]);

        let (a, b) = futures_util::join!(
            client.fetch_query(&key, || counting_fetch(&calls, "alpha")),
            client.fetch_query(&key, || counting_fetch(&calls, "beta")),
        );

        assert_eq!(a.unwrap(), vec!["alpha"]);
        assert_eq!(b.unwrap(), vec!["alpha"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cached_data_is_served_until_invalidated() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::from(["projects", "p1", "tasks"]);

        client
            .fetch_query(&key, || counting_fetch(&calls, "v1"))
            .await
            .unwrap();
        let again = client
            .fetch_query(&key, || counting_fetch(&calls, "v2"))
            .await
            .unwrap();
        assert_eq!(again, vec!["v1"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        client.invalidate(&QueryKey::from(["projects", "p1"]));
        let state = client.state::<Vec<String>>(&key);
        assert!(state.is_stale);
        assert_eq!(state.data, Some(vec!["v1".to_string()]));

        let refreshed = client
            .fetch_query(&key, || counting_fetch(&calls, "v2"))
            .await
            .unwrap();
        assert_eq!(refreshed, vec!["v2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!client.is_stale(&key));
    }

    #[tokio::test]
    async fn later_waiters_do_not_undo_a_patch() {
        let client = QueryClient::new();
        let key = QueryKey::from(["notifications"]);
        let (release, gate) = futures_channel::oneshot::channel::<()>();

        let mut first = Box::pin(client.fetch_query(&key, move || async move {
            let _ = gate.await;
            Ok::<_, ApiError>(vec!["n1".to_string()])
        }));
        let mut second = Box::pin(client.fetch_query(&key, || async {
            Ok::<_, ApiError>(vec!["never".to_string()])
        }));
        assert!(futures_util::poll!(&mut first).is_pending());
        assert!(futures_util::poll!(&mut second).is_pending());

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap(), vec!["n1"]);

        client.update_query_data::<Vec<String>, _>(&key, |list| list.insert(0, "n2".into()));
        assert_eq!(second.await.unwrap(), vec!["n1"]);

        assert_eq!(
            client.get_query_data::<Vec<String>>(&key),
            Some(vec!["n2".to_string(), "n1".to_string()])
        );
    }

    #[tokio::test]
    async fn invalidation_only_touches_matching_prefix() {
        let client = QueryClient::new();
        client.set_query_data(&QueryKey::from(["projects", "p1", "tasks"]), 1u32);
        client.set_query_data(&QueryKey::from(["projects", "p2", "tasks"]), 2u32);
        client.set_query_data(&QueryKey::from(["docs"]), 3u32);

        client.invalidate(&QueryKey::from(["projects", "p1"]));

        assert!(client.is_stale(&QueryKey::from(["projects", "p1", "tasks"])));
        assert!(!client.is_stale(&QueryKey::from(["projects", "p2", "tasks"])));
        assert!(!client.is_stale(&QueryKey::from(["docs"])));
    }

    #[tokio::test]
    async fn fetch_started_before_invalidation_is_stored_stale() {
        let client = QueryClient::new();
        let key = QueryKey::from(["notifications"]);
        let (release, gate) = futures_channel::oneshot::channel::<()>();

        let slow = client.fetch_query(&key, move || async move {
            let _ = gate.await;
            Ok::<_, ApiError>(vec!["before-write".to_string()])
        });
        let (client_ref, key_ref) = (&client, &key);
        let invalidate_then_release = async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            client_ref.invalidate(key_ref);
            let _ = release.send(());
        };
        let (result, ()) = futures_util::join!(slow, invalidate_then_release);

        assert_eq!(result.unwrap(), vec!["before-write"]);
        assert!(client.is_stale(&key));

        let calls = Arc::new(AtomicUsize::new(0));
        let next = client
            .fetch_query(&key, || counting_fetch(&calls, "after-write"))
            .await
            .unwrap();
        assert_eq!(next, vec!["after-write"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_untouched() {
        let client = QueryClient::new();
        let key = QueryKey::from(["projects"]);
        client.set_query_data(&key, vec!["p1".to_string()]);

        let err = client
            .mutate(
                async {
                    Err::<(), _>(ApiError::Api {
                        status: 409,
                        code: "CONFLICT".into(),
                        message: "name taken".into(),
                    })
                },
                &[key.clone()],
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("CONFLICT"));
        assert!(!client.is_stale(&key));
        assert_eq!(
            client.get_query_data::<Vec<String>>(&key),
            Some(vec!["p1".to_string()])
        );
    }

    #[tokio::test]
    async fn successful_mutation_forces_refetch() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::from(["projects", "p1", "tasks"]);
        client
            .fetch_query(&key, || counting_fetch(&calls, "old"))
            .await
            .unwrap();

        client
            .mutate(async { Ok::<_, ApiError>(()) }, &[QueryKey::from(["projects", "p1"])])
            .await
            .unwrap();

        let fresh = client
            .fetch_query(&key, || counting_fetch(&calls, "new"))
            .await
            .unwrap();
        assert_eq!(fresh, vec!["new"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_read_keeps_previous_data() {
        let client = QueryClient::new();
        let key = QueryKey::from(["meetings"]);
        client.set_query_data(&key, vec!["m1".to_string()]);
        client.invalidate(&key);

        let state = client
            .query(&key, || async {
                Err::<Vec<String>, _>(ApiError::Network("connection refused".into()))
            })
            .await;

        assert_eq!(state.data, Some(vec!["m1".to_string()]));
        assert_eq!(state.error, Some(ApiError::Network("connection refused".into())));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn update_patches_only_existing_data() {
        let client = QueryClient::new();
        let key = QueryKey::from(["counter"]);
        assert!(!client.update_query_data::<u32, _>(&key, |n| *n += 1));

        client.set_query_data(&key, 1u32);
        assert!(client.update_query_data::<u32, _>(&key, |n| *n += 1));
        assert_eq!(client.get_query_data::<u32>(&key), Some(2));
        // Wrong type is a miss, not a panic.
        assert!(!client.update_query_data::<String, _>(&key, |s| s.push('x')));
    }

    #[tokio::test]
    async fn changes_report_touched_keys() {
        let client = QueryClient::new();
        let mut changes = client.changes();
        let key = QueryKey::from(["users", "u1"]);

        client.set_query_data(&key, 7u8);
        client.remove(&QueryKey::from(["users"]));

        assert_eq!(changes.next().await, Some(key.clone()));
        assert_eq!(changes.next().await, Some(key));
        assert_eq!(client.get_query_data::<u8>(&QueryKey::from(["users", "u1"])), None);
    }
}
