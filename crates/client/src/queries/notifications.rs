use teamspace_shared::{ApiError, Notification, ServerEvent};

use crate::api::NotificationsApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;
use crate::realtime::{EventHub, Subscription};

/// The notification inbox, kept newest first.
///
/// Pushed notifications and read markers patch the cached list in place; a
/// patch is only applied after the server has confirmed the write.
#[derive(Debug, Clone)]
pub struct NotificationQueries {
    api: NotificationsApi,
    cache: QueryClient,
}

impl NotificationQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.notifications(),
            cache: cache.clone(),
        }
    }

    pub fn key() -> QueryKey {
        query_key!["notifications"]
    }

    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(&Self::key(), move || async move { api.list().await })
            .await
    }

    pub async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        self.api.mark_read(id).await?;
        self.cache
            .update_query_data(&Self::key(), |list: &mut Vec<Notification>| {
                mark_read_in(list, id);
            });
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.api.mark_all_read().await?;
        self.cache
            .update_query_data(&Self::key(), |list: &mut Vec<Notification>| {
                mark_all_read_in(list);
            });
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(id).await?;
        self.cache
            .update_query_data(&Self::key(), |list: &mut Vec<Notification>| {
                list.retain(|n| n.id != id);
            });
        Ok(())
    }

    /// Unread entries in the cached list; 0 before the first fetch.
    pub fn unread_count(&self) -> usize {
        self.cache
            .get_query_data::<Vec<Notification>>(&Self::key())
            .map(|list| list.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }

    /// Fold a pushed notification into the cached list. Returns whether the
    /// list changed. Nothing happens until the list has been fetched once.
    pub fn receive(&self, notification: &Notification) -> bool {
        let mut inserted = false;
        self.cache
            .update_query_data(&Self::key(), |list: &mut Vec<Notification>| {
                inserted = merge_incoming(list, notification.clone());
            });
        inserted
    }

    /// Merge every pushed `notification` event into the cache.
    pub fn attach(&self, hub: &EventHub) -> Subscription {
        let this = self.clone();
        hub.subscribe(move |event| {
            if let ServerEvent::Notification(notification) = event {
                if this.receive(notification) {
                    crate::log_debug!("notification {} merged", notification.id);
                }
            }
        })
    }
}

/// Prepend `notification` unless an entry with its id is already present.
/// Returns whether it was inserted.
pub fn merge_incoming(list: &mut Vec<Notification>, notification: Notification) -> bool {
    if list.iter().any(|n| n.id == notification.id) {
        return false;
    }
    list.insert(0, notification);
    true
}

/// Set `read` on the entry with `id`. Returns whether one was found.
pub fn mark_read_in(list: &mut [Notification], id: &str) -> bool {
    match list.iter_mut().find(|n| n.id == id) {
        Some(n) => {
            n.read = true;
            true
        }
        None => false,
    }
}

/// Set `read` on every entry, keeping order.
pub fn mark_all_read_in(list: &mut [Notification]) {
    for n in list.iter_mut() {
        n.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::offline_api;

    fn notification(id: &str, read: bool) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "mention",
            "title": format!("notification {id}"),
            "read": read,
            "createdAt": "2024-05-01T12:00:00Z",
        }))
        .unwrap()
    }

    fn ids(list: &[Notification]) -> Vec<&str> {
        list.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn merge_prepends_and_ignores_duplicates() {
        let mut list = vec![notification("n1", false)];
        assert!(merge_incoming(&mut list, notification("n2", false)));
        assert!(!merge_incoming(&mut list, notification("n2", false)));
        assert_eq!(ids(&list), vec!["n2", "n1"]);
    }

    #[test]
    fn mark_all_read_keeps_order() {
        let mut list = vec![
            notification("n3", false),
            notification("n2", true),
            notification("n1", false),
        ];
        mark_all_read_in(&mut list);
        assert!(list.iter().all(|n| n.read));
        assert_eq!(ids(&list), vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn mark_read_touches_one_entry() {
        let mut list = vec![notification("n2", false), notification("n1", false)];
        assert!(mark_read_in(&mut list, "n1"));
        assert!(!mark_read_in(&mut list, "missing"));
        assert!(!list[0].read);
        assert!(list[1].read);
    }

    #[test]
    fn pushed_duplicates_leave_one_cached_entry() {
        let hub = EventHub::default();
        let cache = QueryClient::new();
        let notifications = NotificationQueries::new(&offline_api(), &cache);
        cache.set_query_data(&NotificationQueries::key(), vec![notification("n1", true)]);
        let _sub = notifications.attach(&hub);

        hub.publish(ServerEvent::Notification(notification("n2", false)));
        hub.publish(ServerEvent::Notification(notification("n2", false)));

        let cached = cache
            .get_query_data::<Vec<Notification>>(&NotificationQueries::key())
            .unwrap();
        assert_eq!(ids(&cached), vec!["n2", "n1"]);
        assert_eq!(notifications.unread_count(), 1);
    }

    #[test]
    fn pushes_before_the_first_fetch_are_not_cached() {
        let cache = QueryClient::new();
        let notifications = NotificationQueries::new(&offline_api(), &cache);
        assert!(!notifications.receive(&notification("n1", false)));
        assert!(cache
            .get_query_data::<Vec<Notification>>(&NotificationQueries::key())
            .is_none());
        assert_eq!(notifications.unread_count(), 0);
    }

    #[tokio::test]
    async fn failed_mark_all_read_leaves_the_cache_alone() {
        let cache = QueryClient::new();
        let notifications = NotificationQueries::new(&offline_api(), &cache);
        cache.set_query_data(&NotificationQueries::key(), vec![notification("n1", false)]);

        assert!(notifications.mark_all_read().await.is_err());
        assert_eq!(notifications.unread_count(), 1);
    }
}
