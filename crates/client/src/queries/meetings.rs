use teamspace_shared::{ApiError, Meeting, MeetingInput, MeetingJoin, ServerEvent};

use crate::api::MeetingsApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;
use crate::realtime::{EventHub, Subscription};

#[derive(Debug, Clone)]
pub struct MeetingQueries {
    api: MeetingsApi,
    cache: QueryClient,
}

impl MeetingQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.meetings(),
            cache: cache.clone(),
        }
    }

    pub fn all_key() -> QueryKey {
        query_key!["meetings"]
    }

    pub fn detail_key(id: &str) -> QueryKey {
        query_key!["meetings", id]
    }

    pub async fn list(&self) -> Result<Vec<Meeting>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(&Self::all_key(), move || async move { api.list().await })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Meeting, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::detail_key(id), move || async move { api.get(&owned).await })
            .await
    }

    pub async fn create(&self, input: &MeetingInput) -> Result<Meeting, ApiError> {
        self.cache
            .mutate(self.api.create(input), &[Self::all_key()])
            .await
    }

    pub async fn update(&self, id: &str, input: &MeetingInput) -> Result<Meeting, ApiError> {
        self.cache
            .mutate(self.api.update(id, input), &[Self::all_key()])
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete(id), &[Self::all_key()])
            .await
    }

    /// Join a meeting. Joining changes participant state, so the meetings
    /// cache is invalidated.
    pub async fn join(&self, id: &str) -> Result<MeetingJoin, ApiError> {
        self.cache
            .mutate(self.api.join(id), &[Self::all_key()])
            .await
    }

    /// Invalidate `["meetings"]` whenever a meeting starts or ends.
    pub fn attach(&self, hub: &EventHub) -> Subscription {
        let cache = self.cache.clone();
        hub.subscribe(move |event| apply_event(&cache, event))
    }
}

fn apply_event(cache: &QueryClient, event: &ServerEvent) {
    if let ServerEvent::MeetingStarted(meeting) | ServerEvent::MeetingEnded(meeting) = event {
        crate::log_debug!("{} for meeting {}", event.kind(), meeting.id);
        cache.invalidate(&MeetingQueries::all_key());
    }
}
