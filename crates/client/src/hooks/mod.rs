//! Dioxus bindings for the data layer.
//!
//! Components never talk to the socket or the HTTP client directly: they read
//! cached queries and stores through these hooks and re-render when the cache
//! or store changes underneath them.

mod context;
mod query;
mod store;

pub use context::{use_app, AppProvider};
pub use query::use_query;
pub use store::{use_debounced, use_store};
