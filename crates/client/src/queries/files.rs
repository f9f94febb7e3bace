use teamspace_shared::{ApiError, FileAttachment};

use crate::api::FilesApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;

/// Uploaded files. An upload seeds `["files", id]`; a delete drops it.
#[derive(Debug, Clone)]
pub struct FileQueries {
    api: FilesApi,
    cache: QueryClient,
}

impl FileQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.files(),
            cache: cache.clone(),
        }
    }

    pub fn detail_key(id: &str) -> QueryKey {
        query_key!["files", id]
    }

    pub async fn upload(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<FileAttachment, ApiError> {
        let attachment = self.api.upload(name, mime_type, bytes).await?;
        crate::log_info!("uploaded {} as {}", name, attachment.id);
        self.cache
            .set_query_data(&Self::detail_key(&attachment.id), attachment.clone());
        Ok(attachment)
    }

    pub async fn get(&self, id: &str) -> Result<FileAttachment, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::detail_key(id), move || async move { api.get(&owned).await })
            .await
    }

    /// Retrievable URL for a file's bytes.
    pub fn url(&self, id: &str) -> String {
        self.api.url(id)
    }

    /// Best-effort delete; never fails.
    pub async fn delete(&self, id: &str) {
        self.api.delete(id).await;
        self.cache.remove(&Self::detail_key(id));
    }
}
