use teamspace_shared::{ApiError, Doc, DocInput};

use super::scope;
use crate::api::DocsApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;

/// Docs, listed per project scope. Every write invalidates `["docs"]`.
#[derive(Debug, Clone)]
pub struct DocQueries {
    api: DocsApi,
    cache: QueryClient,
}

impl DocQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.docs(),
            cache: cache.clone(),
        }
    }

    pub fn all_key() -> QueryKey {
        query_key!["docs"]
    }

    pub fn list_key(project_id: Option<&str>) -> QueryKey {
        query_key!["docs", scope(project_id)]
    }

    pub fn detail_key(id: &str) -> QueryKey {
        query_key!["docs", "detail", id]
    }

    pub async fn list(&self, project_id: Option<&str>) -> Result<Vec<Doc>, ApiError> {
        let api = self.api.clone();
        let owned = project_id.map(str::to_string);
        self.cache
            .fetch_query(&Self::list_key(project_id), move || async move {
                api.list(owned.as_deref()).await
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Doc, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::detail_key(id), move || async move { api.get(&owned).await })
            .await
    }

    pub async fn create(&self, input: &DocInput) -> Result<Doc, ApiError> {
        self.cache
            .mutate(self.api.create(input), &[Self::all_key()])
            .await
    }

    pub async fn update(&self, id: &str, input: &DocInput) -> Result<Doc, ApiError> {
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
