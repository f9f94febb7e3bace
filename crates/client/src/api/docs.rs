use teamspace_shared::{ApiError, Doc, DocInput};

use super::{seg, with_query};
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct DocsApi {
    client: ApiClient,
}

impl DocsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All docs visible to the user, or only those of one project.
    pub async fn list(&self, project_id: Option<&str>) -> Result<Vec<Doc>, ApiError> {
        self.client
            .get_json(&with_query("/docs", "projectId", project_id))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Doc, ApiError> {
        self.client.get_json(&format!("/docs/{}", seg(id))).await
    }

    pub async fn create(&self, input: &DocInput) -> Result<Doc, ApiError> {
        self.client.post_json("/docs", input).await
    }

    pub async fn update(&self, id: &str, input: &DocInput) -> Result<Doc, ApiError> {
        self.client
            .patch_json(&format!("/docs/{}", seg(id)), input)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/docs/{}", seg(id))).await
    }
}
