//! Resource API modules.
//!
//! One struct per domain object, each a thin set of request builders over
//! [`ApiClient`]. No caching and no validation happens here.

mod auth;
mod chat;
mod docs;
mod files;
mod meetings;
mod notifications;
mod projects;
mod users;
mod whiteboards;

pub use auth::AuthApi;
pub use chat::ChatApi;
pub use docs::DocsApi;
pub use files::FilesApi;
pub use meetings::MeetingsApi;
pub use notifications::NotificationsApi;
pub use projects::ProjectsApi;
pub use users::UsersApi;
pub use whiteboards::WhiteboardsApi;

use crate::api_client::ApiClient;

impl ApiClient {
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.clone())
    }

    pub fn docs(&self) -> DocsApi {
        DocsApi::new(self.clone())
    }

    pub fn files(&self) -> FilesApi {
        FilesApi::new(self.clone())
    }

    pub fn meetings(&self) -> MeetingsApi {
        MeetingsApi::new(self.clone())
    }

    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.clone())
    }

    pub fn projects(&self) -> ProjectsApi {
        ProjectsApi::new(self.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    pub fn whiteboards(&self) -> WhiteboardsApi {
        WhiteboardsApi::new(self.clone())
    }
}

/// `path` with an optional `key=value` query, value percent-encoded.
pub(crate) fn with_query(path: &str, key: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("{path}?{key}={}", urlencoding::encode(v)),
        None => path.to_string(),
    }
}

/// Percent-encode a single path segment.
pub(crate) fn seg(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_are_encoded() {
        assert_eq!(with_query("/docs", "projectId", None), "/docs");
        assert_eq!(
            with_query("/docs", "projectId", Some("a b&c")),
            "/docs?projectId=a%20b%26c"
        );
        assert_eq!(seg("x/y"), "x%2Fy");
    }
}
