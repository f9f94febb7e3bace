use teamspace_shared::{ApiError, LoginInput, RegisterInput, User};

use crate::api_client::ApiClient;

/// Session endpoints. The session itself lives in the cookie jar.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, input: &LoginInput) -> Result<User, ApiError> {
        self.client.post_json("/auth/login", input).await
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<User, ApiError> {
        self.client.post_json("/auth/register", input).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client.post_empty("/auth/logout").await
    }

    /// Who the current session belongs to. Fails with 401 once the session
    /// has expired.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.client.get_json("/auth/me").await
    }
}
