//! Application context: everything the data layer shares, in one value that
//! is passed explicitly (and placed in Dioxus context by `AppProvider`).

use std::sync::{Arc, Mutex, MutexGuard};

use teamspace_shared::ApiError;

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::queries::{
    AuthQueries, ChatQueries, DocQueries, FileQueries, MeetingQueries, NotificationQueries,
    ProjectQueries, UserQueries, WhiteboardQueries,
};
use crate::query::QueryClient;
use crate::realtime::{ConnectionState, EventHub, RealtimeConnection, RealtimeHandle, Subscription};
use crate::storage::{self, PreferenceStorage};
use crate::stores::{AuthStore, ChatStore, Store, UiStore};

struct Realtime {
    connection: RealtimeConnection,
    _merges: Vec<Subscription>,
}

/// Shared client state. Clones are cheap and see the same caches and stores.
#[derive(Clone)]
pub struct AppState {
    config: ClientConfig,
    api: ApiClient,
    queries: QueryClient,
    hub: EventHub,
    auth: AuthStore,
    chat: ChatStore,
    ui: UiStore,
    realtime: Arc<Mutex<Option<Realtime>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_url", &self.config.api_url.as_str())
            .field("queries", &self.queries)
            .field("hub", &self.hub)
            .field("realtime", &self.connection_state())
            .finish()
    }
}

impl PartialEq for AppState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.realtime, &other.realtime)
    }
}

impl AppState {
    /// Build the context with the platform's preference storage.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_storage(config, storage::platform_storage())
    }

    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn PreferenceStorage>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        crate::log_info!("client configured for {}", config.api_url);
        Ok(Self {
            hub: EventHub::new(config.event_buffer),
            api,
            config,
            queries: QueryClient::new(),
            auth: AuthStore::new(),
            chat: ChatStore::new(),
            ui: UiStore::new(storage),
            realtime: Arc::new(Mutex::new(None)),
        })
    }

    fn lock_realtime(&self) -> MutexGuard<'_, Option<Realtime>> {
        self.realtime.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.auth
    }

    pub fn chat_store(&self) -> &ChatStore {
        &self.chat
    }

    pub fn ui(&self) -> &UiStore {
        &self.ui
    }

    // --- Bindings ---

    pub fn auth(&self) -> AuthQueries {
        AuthQueries::new(&self.api, &self.queries, &self.auth)
    }

    pub fn projects(&self) -> ProjectQueries {
        ProjectQueries::new(&self.api, &self.queries)
    }

    pub fn docs(&self) -> DocQueries {
        DocQueries::new(&self.api, &self.queries)
    }

    pub fn meetings(&self) -> MeetingQueries {
        MeetingQueries::new(&self.api, &self.queries)
    }

    pub fn whiteboards(&self) -> WhiteboardQueries {
        WhiteboardQueries::new(&self.api, &self.queries)
    }

    pub fn users(&self) -> UserQueries {
        UserQueries::new(&self.api, &self.queries)
    }

    pub fn notifications(&self) -> NotificationQueries {
        NotificationQueries::new(&self.api, &self.queries)
    }

    pub fn chat(&self) -> ChatQueries {
        ChatQueries::new(&self.api, &self.queries)
    }

    pub fn files(&self) -> FileQueries {
        FileQueries::new(&self.api, &self.queries)
    }

    // --- Real-time ---

    /// Open the real-time socket and attach the notification, chat and
    /// meeting merges. Calling it again returns the live connection's handle;
    /// a connection that has given up reconnecting is replaced.
    pub fn connect_realtime(&self) -> RealtimeHandle {
        let mut slot = self.lock_realtime();
        if let Some(realtime) = slot.as_ref() {
            let handle = realtime.connection.handle();
            if !handle.is_closed() {
                return handle;
            }
            crate::log_info!("previous real-time connection stopped; opening a new one");
        }
        *slot = None;

        let merges = vec![
            self.notifications().attach(&self.hub),
            self.chat().attach(&self.hub),
            self.meetings().attach(&self.hub),
        ];
        let connection =
            RealtimeConnection::connect(&self.api, self.hub.clone(), self.config.reconnect.clone());
        let handle = connection.handle();
        *slot = Some(Realtime {
            connection,
            _merges: merges,
        });
        handle
    }

    /// Handle to the open connection, if any.
    pub fn realtime(&self) -> Option<RealtimeHandle> {
        self.lock_realtime()
            .as_ref()
            .map(|realtime| realtime.connection.handle())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lock_realtime()
            .as_ref()
            .map(|realtime| realtime.connection.state())
            .unwrap_or(ConnectionState::Closed)
    }

    /// Observable state of the open connection, if any.
    pub fn connection_state_store(&self) -> Option<Store<ConnectionState>> {
        self.lock_realtime()
            .as_ref()
            .map(|realtime| realtime.connection.state_store())
    }

    /// Close the socket and detach the merges.
    pub fn disconnect_realtime(&self) {
        if let Some(realtime) = self.lock_realtime().take() {
            realtime.connection.close();
        }
    }

    /// Log out and drop the real-time connection. Local state is cleared even
    /// when the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.disconnect_realtime();
        self.auth().logout().await
    }
}
