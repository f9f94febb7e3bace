use teamspace_shared::{ApiError, UpdateUserInput, User};

use super::AuthQueries;
use crate::api::UsersApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;

#[derive(Debug, Clone)]
pub struct UserQueries {
    api: UsersApi,
    cache: QueryClient,
}

impl UserQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.users(),
            cache: cache.clone(),
        }
    }

    pub fn all_key() -> QueryKey {
        query_key!["users"]
    }

    pub fn detail_key(id: &str) -> QueryKey {
        query_key!["users", id]
    }

    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(&Self::all_key(), move || async move { api.list().await })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<User, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::detail_key(id), move || async move { api.get(&owned).await })
            .await
    }

    /// Update the signed-in user's profile. Invalidates `["users"]` and
    /// `["me"]`.
    pub async fn update_me(&self, input: &UpdateUserInput) -> Result<User, ApiError> {
        self.cache
            .mutate(
                self.api.update_me(input),
                &[Self::all_key(), AuthQueries::me_key()],
            )
            .await
    }
}
