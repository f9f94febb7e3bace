use teamspace_shared::{ApiError, Notification};

use super::seg;
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct NotificationsApi {
    client: ApiClient,
}

impl NotificationsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        self.client.get_json("/notifications").await
    }

    pub async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(&format!("/notifications/{}/read", seg(id)))
            .await
    }

    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.client.post_empty("/notifications/read-all").await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/notifications/{}", seg(id)))
            .await
    }
}
