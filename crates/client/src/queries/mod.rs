//! Per-resource cache bindings.
//!
//! Each binding pairs a resource API with the shared [`QueryClient`]: reads go
//! through the cache under a fixed key scheme, writes invalidate (or patch) the
//! keys they affect once the server confirms them.
//!
//! [`QueryClient`]: crate::query::QueryClient

mod auth;
mod chat;
mod docs;
mod files;
mod meetings;
mod notifications;
mod projects;
mod users;
mod whiteboards;

pub use auth::AuthQueries;
pub use chat::ChatQueries;
pub use docs::DocQueries;
pub use files::FileQueries;
pub use meetings::MeetingQueries;
pub use notifications::NotificationQueries;
pub use projects::ProjectQueries;
pub use users::UserQueries;
pub use whiteboards::WhiteboardQueries;

/// Merge routines that fold real-time events into cached lists. Pure
/// functions over the cached value, usable without a cache.
pub mod merge {
    pub use super::chat::{
        insert_message, remove_message, remove_reaction, replace_message, upsert_reaction,
    };
    pub use super::notifications::{mark_all_read_in, mark_read_in, merge_incoming};
}

/// Cache segment for a list that may be filtered by project.
pub(crate) fn scope(project_id: Option<&str>) -> String {
    match project_id {
        Some(id) => format!("project:{id}"),
        None => "all".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::api_client::ApiClient;
    use crate::config::ClientConfig;

    /// A client pointed at a port nothing listens on; any request fails with
    /// a network error.
    pub fn offline_api() -> ApiClient {
        let config = ClientConfig::new("http://127.0.0.1:9/api/v1").unwrap();
        ApiClient::new(&config).unwrap()
    }
}
