use teamspace_shared::{ApiError, Channel, CreateChannelInput, Message, MessageReaction, SendMessageInput};

use super::{seg, with_query};
use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct ChatApi {
    client: ApiClient,
}

#[derive(serde::Serialize)]
struct EditMessage<'a> {
    content: &'a str,
}

#[derive(serde::Serialize)]
struct AddReaction<'a> {
    emoji: &'a str,
}

impl ChatApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, ApiError> {
        self.client.get_json("/channels").await
    }

    pub async fn get_channel(&self, id: &str) -> Result<Channel, ApiError> {
        self.client.get_json(&format!("/channels/{}", seg(id))).await
    }

    pub async fn create_channel(&self, input: &CreateChannelInput) -> Result<Channel, ApiError> {
        self.client.post_json("/channels", input).await
    }

    /// A page of messages, oldest first. `before` is a message id cursor.
    pub async fn list_messages(
        &self,
        channel_id: &str,
        before: Option<&str>,
    ) -> Result<Vec<Message>, ApiError> {
        let path = format!("/channels/{}/messages", seg(channel_id));
        self.client
            .get_json(&with_query(&path, "before", before))
            .await
    }

    pub async fn send_message(
        &self,
        channel_id: &str,
        input: &SendMessageInput,
    ) -> Result<Message, ApiError> {
        self.client
            .post_json(&format!("/channels/{}/messages", seg(channel_id)), input)
            .await
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        self.client
            .patch_json(
                &format!("/channels/{}/messages/{}", seg(channel_id), seg(message_id)),
                &EditMessage { content },
            )
            .await
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/channels/{}/messages/{}", seg(channel_id), seg(message_id)))
            .await
    }

    pub async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<MessageReaction, ApiError> {
        self.client
            .post_json(
                &format!(
                    "/channels/{}/messages/{}/reactions",
                    seg(channel_id),
                    seg(message_id)
                ),
                &AddReaction { emoji },
            )
            .await
    }

    pub async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        self.client
            .delete(&format!(
                "/channels/{}/messages/{}/reactions/{}",
                seg(channel_id),
                seg(message_id),
                seg(emoji)
            ))
            .await
    }
}
