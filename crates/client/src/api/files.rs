use reqwest::multipart::{Form, Part};
use teamspace_shared::{ApiError, FileAttachment};

use super::seg;
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct FilesApi {
    client: ApiClient,
}

impl FilesApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload a file as the `file` part of a multipart form.
    pub async fn upload(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<FileAttachment, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime_type)
            .map_err(|e| ApiError::Malformed(format!("invalid mime type `{mime_type}`: {e}")))?;
        let form = Form::new().part("file", part);
        self.client.post_multipart("/files", form).await
    }

    pub async fn get(&self, id: &str) -> Result<FileAttachment, ApiError> {
        self.client.get_json(&format!("/files/{}", seg(id))).await
    }

    /// Where the file's bytes can be fetched.
    pub fn url(&self, id: &str) -> String {
        self.client.url(&format!("/files/{}/content", seg(id)))
    }

    /// Best-effort cleanup: missing files and server errors are ignored.
    pub async fn delete(&self, id: &str) {
        self.client
            .delete_best_effort(&format!("/files/{}", seg(id)))
            .await
    }
}
