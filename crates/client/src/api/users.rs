use teamspace_shared::{ApiError, UpdateUserInput, User};

use super::seg;
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.client.get_json("/users").await
    }

    pub async fn get(&self, id: &str) -> Result<User, ApiError> {
        self.client.get_json(&format!("/users/{}", seg(id))).await
    }

    pub async fn update_me(&self, input: &UpdateUserInput) -> Result<User, ApiError> {
        self.client.patch_json("/users/me", input).await
    }
}
