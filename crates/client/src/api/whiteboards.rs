use teamspace_shared::{ApiError, Whiteboard, WhiteboardInput};

use super::{seg, with_query};
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct WhiteboardsApi {
    client: ApiClient,
}

impl WhiteboardsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, project_id: Option<&str>) -> Result<Vec<Whiteboard>, ApiError> {
        self.client
            .get_json(&with_query("/whiteboards", "projectId", project_id))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Whiteboard, ApiError> {
        self.client
            .get_json(&format!("/whiteboards/{}", seg(id)))
            .await
    }

    pub async fn create(&self, input: &WhiteboardInput) -> Result<Whiteboard, ApiError> {
        self.client.post_json("/whiteboards", input).await
    }

    /// Saves the canvas snapshot and/or title.
    pub async fn update(&self, id: &str, input: &WhiteboardInput) -> Result<Whiteboard, ApiError> {
        self.client
            .patch_json(&format!("/whiteboards/{}", seg(id)), input)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/whiteboards/{}", seg(id)))
            .await
    }
}
