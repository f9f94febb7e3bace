use teamspace_shared::{
    ApiError, Channel, CreateChannelInput, Message, MessageReaction, SendMessageInput, ServerEvent,
};

use crate::api::ChatApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;
use crate::realtime::{EventHub, Subscription};

/// Channels and their message lists.
///
/// Message lists are cached oldest first under
/// `["channels", id, "messages"]`. Confirmed writes and pushed events patch
/// them in place; channels that have not been fetched are left alone.
#[derive(Debug, Clone)]
pub struct ChatQueries {
    api: ChatApi,
    cache: QueryClient,
}

impl ChatQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.chat(),
            cache: cache.clone(),
        }
    }

    pub fn channels_key() -> QueryKey {
        query_key!["channels"]
    }

    pub fn channel_key(id: &str) -> QueryKey {
        query_key!["channels", id]
    }

    pub fn messages_key(channel_id: &str) -> QueryKey {
        query_key!["channels", channel_id, "messages"]
    }

    // --- Channels ---

    pub async fn channels(&self) -> Result<Vec<Channel>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(&Self::channels_key(), move || async move {
                api.list_channels().await
            })
            .await
    }

    pub async fn channel(&self, id: &str) -> Result<Channel, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::channel_key(id), move || async move {
                api.get_channel(&owned).await
            })
            .await
    }

    pub async fn create_channel(&self, input: &CreateChannelInput) -> Result<Channel, ApiError> {
        self.cache
            .mutate(self.api.create_channel(input), &[Self::channels_key()])
            .await
    }

    // --- Messages ---

    /// Latest page of a channel's messages.
    pub async fn messages(&self, channel_id: &str) -> Result<Vec<Message>, ApiError> {
        let api = self.api.clone();
        let owned = channel_id.to_string();
        self.cache
            .fetch_query(&Self::messages_key(channel_id), move || async move {
                api.list_messages(&owned, None).await
            })
            .await
    }

    /// Fetch the page before `before` and merge it into the cached list.
    pub async fn load_older(&self, channel_id: &str, before: &str) -> Result<Vec<Message>, ApiError> {
        let page = self.api.list_messages(channel_id, Some(before)).await?;
        self.patch(channel_id, |list| {
            page.iter()
                .fold(false, |changed, m| insert_message(list, m.clone()) || changed)
        });
        Ok(page)
    }

    pub async fn send_message(
        &self,
        channel_id: &str,
        input: &SendMessageInput,
    ) -> Result<Message, ApiError> {
        let message = self.api.send_message(channel_id, input).await?;
        self.patch(channel_id, |list| insert_message(list, message.clone()));
        Ok(message)
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let message = self.api.edit_message(channel_id, message_id, content).await?;
        self.patch(channel_id, |list| replace_message(list, message.clone()));
        Ok(message)
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ApiError> {
        self.api.delete_message(channel_id, message_id).await?;
        self.patch(channel_id, |list| remove_message(list, message_id));
        Ok(())
    }

    pub async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<MessageReaction, ApiError> {
        let reaction = self.api.add_reaction(channel_id, message_id, emoji).await?;
        self.patch(channel_id, |list| upsert_reaction(list, &reaction));
        Ok(reaction)
    }

    /// The server does not echo the removed reaction, so the message list is
    /// invalidated instead of patched.
    pub async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        self.cache
            .mutate(
                self.api.remove_reaction(channel_id, message_id, emoji),
                &[Self::messages_key(channel_id)],
            )
            .await
    }

    /// Apply a pushed event to the cached message lists. Returns whether a
    /// cached list changed.
    pub fn receive(&self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::MessageCreated(message) => {
                self.patch(&message.channel_id, |list| insert_message(list, message.clone()))
            }
            ServerEvent::MessageUpdated(message) => {
                self.patch(&message.channel_id, |list| replace_message(list, message.clone()))
            }
            ServerEvent::MessageDeleted(target) => {
                self.patch(&target.channel_id, |list| remove_message(list, &target.message_id))
            }
            ServerEvent::ReactionAdded(event) => {
                self.patch(&event.channel_id, |list| upsert_reaction(list, &event.reaction))
            }
            ServerEvent::ReactionRemoved(event) => {
                self.patch(&event.channel_id, |list| remove_reaction(list, &event.reaction))
            }
            _ => false,
        }
    }

    /// Merge message and reaction events into the cache.
    pub fn attach(&self, hub: &EventHub) -> Subscription {
        let this = self.clone();
        hub.subscribe(move |event| {
            this.receive(event);
        })
    }

    /// Run `f` on the cached list for `channel_id`. Returns what `f` returned,
    /// or `false` when the channel is not cached.
    fn patch<F>(&self, channel_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Vec<Message>) -> bool,
    {
        let mut changed = false;
        self.cache
            .update_query_data(&Self::messages_key(channel_id), |list: &mut Vec<Message>| {
                changed = f(list);
            });
        changed
    }
}

/// Insert keeping `created_at` ascending; messages with equal timestamps stay
/// in arrival order. Returns `false` if the id is already present.
pub fn insert_message(list: &mut Vec<Message>, message: Message) -> bool {
    if list.iter().any(|m| m.id == message.id) {
        return false;
    }
    let pos = list.partition_point(|m| m.created_at <= message.created_at);
    list.insert(pos, message);
    true
}

/// Replace the entry with the same id. Returns `false` if there is none.
pub fn replace_message(list: &mut [Message], message: Message) -> bool {
    match list.iter_mut().find(|m| m.id == message.id) {
        Some(slot) => {
            *slot = message;
            true
        }
        None => false,
    }
}

pub fn remove_message(list: &mut Vec<Message>, message_id: &str) -> bool {
    let before = list.len();
    list.retain(|m| m.id != message_id);
    list.len() != before
}

/// Attach `reaction` to its message unless the same user already reacted
/// with the same emoji.
pub fn upsert_reaction(list: &mut [Message], reaction: &MessageReaction) -> bool {
    let Some(message) = list.iter_mut().find(|m| m.id == reaction.message_id) else {
        return false;
    };
    let duplicate = message.reactions.iter().any(|r| {
        r.id == reaction.id || (r.user_id == reaction.user_id && r.emoji == reaction.emoji)
    });
    if duplicate {
        return false;
    }
    message.reactions.push(reaction.clone());
    true
}

/// Drop `reaction` (matched by id, or by user and emoji) from its message.
pub fn remove_reaction(list: &mut [Message], reaction: &MessageReaction) -> bool {
    let Some(message) = list.iter_mut().find(|m| m.id == reaction.message_id) else {
        return false;
    };
    let before = message.reactions.len();
    message.reactions.retain(|r| {
        !(r.id == reaction.id || (r.user_id == reaction.user_id && r.emoji == reaction.emoji))
    });
    message.reactions.len() != before
}
