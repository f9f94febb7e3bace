use teamspace_shared::{ApiError, Meeting, MeetingInput, MeetingJoin};

use super::seg;
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct MeetingsApi {
    client: ApiClient,
}

impl MeetingsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Meeting>, ApiError> {
        self.client.get_json("/meetings").await
    }

    pub async fn get(&self, id: &str) -> Result<Meeting, ApiError> {
        self.client.get_json(&format!("/meetings/{}", seg(id))).await
    }

    pub async fn create(&self, input: &MeetingInput) -> Result<Meeting, ApiError> {
        self.client.post_json("/meetings", input).await
    }

    pub async fn update(&self, id: &str, input: &MeetingInput) -> Result<Meeting, ApiError> {
        self.client
            .patch_json(&format!("/meetings/{}", seg(id)), input)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/meetings/{}", seg(id))).await
    }

    /// Room credentials for the media server.
    pub async fn join(&self, id: &str) -> Result<MeetingJoin, ApiError> {
        self.client
            .post_empty(&format!("/meetings/{}/join", seg(id)))
            .await
    }
}
