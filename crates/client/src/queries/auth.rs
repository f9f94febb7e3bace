use teamspace_shared::{ApiError, LoginInput, RegisterInput, User};

use crate::api::AuthApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;
use crate::stores::AuthStore;

/// Session lifecycle. Keeps the [`AuthStore`] and the `["me"]` entry in step
/// with the server's view of the session.
#[derive(Debug, Clone)]
pub struct AuthQueries {
    api: AuthApi,
    cache: QueryClient,
    store: AuthStore,
}

impl AuthQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient, store: &AuthStore) -> Self {
        Self {
            api: client.auth(),
            cache: cache.clone(),
            store: store.clone(),
        }
    }

    pub fn me_key() -> QueryKey {
        query_key!["me"]
    }

    /// Start a session. Anything cached for a previous user is dropped.
    pub async fn login(&self, input: &LoginInput) -> Result<User, ApiError> {
        let user = self.api.login(input).await?;
        self.start_session(&user);
        Ok(user)
    }

    /// Create an account; the server signs the new user in.
    pub async fn register(&self, input: &RegisterInput) -> Result<User, ApiError> {
        let user = self.api.register(input).await?;
        self.start_session(&user);
        Ok(user)
    }

    /// End the session. Local state is cleared even when the server call
    /// fails; the error is still returned.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.api.logout().await;
        if let Err(e) = &result {
            crate::log_warn!("logout request failed, clearing local session anyway: {}", e);
        }
        self.cache.clear();
        self.store.clear();
        result
    }

    /// The session's user. A 401 means the session is gone: the store and
    /// the `["me"]` entry are cleared before the error is returned.
    pub async fn me(&self) -> Result<User, ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .fetch_query(&Self::me_key(), move || async move { api.me().await })
            .await;

        match &result {
            Ok(user) => {
                if self.store.user().as_ref() != Some(user) {
                    self.store.set_user(user.clone());
                }
            }
            Err(e) if e.is_unauthorized() => {
                crate::log_info!("session expired");
                self.cache.remove(&Self::me_key());
                self.store.clear();
            }
            Err(_) => {}
        }
        result
    }

    fn start_session(&self, user: &User) {
        self.cache.clear();
        self.cache.set_query_data(&Self::me_key(), user.clone());
        self.store.set_user(user.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::offline_api;

    fn user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "ada@example.com",
            "name": "Ada",
            "createdAt": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn logout_clears_local_state_even_when_the_server_is_unreachable() {
        let cache = QueryClient::new();
        let store = AuthStore::new();
        let auth = AuthQueries::new(&offline_api(), &cache, &store);

        store.set_user(user());
        cache.set_query_data(&AuthQueries::me_key(), user());
        cache.set_query_data(&query_key!["projects"], vec![1, 2, 3]);

        let result = auth.logout().await;

        assert!(matches!(result, Err(ApiError::Network(_))));
        assert!(store.user().is_none());
        assert!(cache.get_query_data::<User>(&AuthQueries::me_key()).is_none());
        assert!(cache.get_query_data::<Vec<i32>>(&query_key!["projects"]).is_none());
    }

    #[tokio::test]
    async fn cached_me_populates_the_store() {
        let cache = QueryClient::new();
        let store = AuthStore::new();
        let auth = AuthQueries::new(&offline_api(), &cache, &store);
        cache.set_query_data(&AuthQueries::me_key(), user());

        let me = auth.me().await.unwrap();
        assert_eq!(me.id, "u1");
        assert_eq!(store.user(), Some(me));
    }
}
