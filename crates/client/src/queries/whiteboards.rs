use teamspace_shared::{ApiError, Whiteboard, WhiteboardInput};

use super::scope;
use crate::api::WhiteboardsApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;

/// Whiteboards, listed per project scope. Every write invalidates
/// `["whiteboards"]`.
#[derive(Debug, Clone)]
pub struct WhiteboardQueries {
    api: WhiteboardsApi,
    cache: QueryClient,
}

impl WhiteboardQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.whiteboards(),
            cache: cache.clone(),
        }
    }

    pub fn all_key() -> QueryKey {
        query_key!["whiteboards"]
    }

    pub fn list_key(project_id: Option<&str>) -> QueryKey {
        query_key!["whiteboards", scope(project_id)]
    }

    pub fn detail_key(id: &str) -> QueryKey {
        query_key!["whiteboards", "detail", id]
    }

    pub async fn list(&self, project_id: Option<&str>) -> Result<Vec<Whiteboard>, ApiError> {
        let api = self.api.clone();
        let owned = project_id.map(str::to_string);
        self.cache
            .fetch_query(&Self::list_key(project_id), move || async move {
                api.list(owned.as_deref()).await
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Whiteboard, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::detail_key(id), move || async move { api.get(&owned).await })
            .await
    }

    pub async fn create(&self, input: &WhiteboardInput) -> Result<Whiteboard, ApiError> {
        self.cache
            .mutate(self.api.create(input), &[Self::all_key()])
            .await
    }

    /// Save a scene or rename a board.
    pub async fn update(&self, id: &str, input: &WhiteboardInput) -> Result<Whiteboard, ApiError> {
        self.cache
            .mutate(self.api.update(id, input), &[Self::all_key()])
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete(id), &[Self::all_key()])
            .await
    }
}
