//! Teamspace Client - data layer for the Teamspace web/desktop application
//!
//! REST calls go through [`ApiClient`] and land in the [`QueryClient`] cache.
//! Server-pushed events arrive over a [`RealtimeConnection`], fan out through
//! the [`EventHub`], and are merged into the same cache. Dioxus components
//! read all of it through the hooks in [`hooks`].

pub mod api;
pub mod api_client;
pub mod app;
pub mod config;
pub mod debounce;
pub mod hooks;
pub mod logging;
pub mod platform;
pub mod queries;
pub mod query;
pub mod realtime;
pub mod shortcuts;
pub mod storage;
pub mod stores;

pub use api_client::ApiClient;
pub use app::AppState;
pub use config::{ClientConfig, ConfigError};
pub use debounce::Debouncer;
pub use query::{QueryClient, QueryKey, QueryState};
pub use realtime::{ConnectionState, EventHub, RealtimeConnection, RealtimeHandle, Subscription};
pub use shortcuts::{KeyPress, Shortcut, ShortcutMap};
pub use stores::{AuthStore, ChatStore, Store, UiStore};
