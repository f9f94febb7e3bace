//! Real-time protocol definitions.
//!
//! Every WebSocket frame is a JSON object `{"type": "...", "payload": {...}}`.
//! Inbound frames decode into [`ServerEvent`], outbound ones are built from
//! [`ClientCommand`] and wrapped in a [`WsEnvelope`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Meeting, Message, MessageReaction, Notification};

/// Outbound frame wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsEnvelope<T> {
    pub id: String,
    #[serde(flatten)]
    pub payload: T,
    pub ts: DateTime<Utc>,
}

impl<T> WsEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            ts: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    Subscribe { channel_id: String },
    #[serde(rename_all = "camelCase")]
    Unsubscribe { channel_id: String },
    #[serde(rename_all = "camelCase")]
    Typing { channel_id: String },
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    pub channel_id: String,
    pub reaction: MessageReaction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub channel_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: String,
    pub status: String,
}

/// Typed inbound event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "notification")]
    Notification(Notification),
    #[serde(rename = "message.created")]
    MessageCreated(Message),
    #[serde(rename = "message.updated")]
    MessageUpdated(Message),
    #[serde(rename = "message.deleted")]
    MessageDeleted(MessageRef),
    #[serde(rename = "reaction.added")]
    ReactionAdded(ReactionEvent),
    #[serde(rename = "reaction.removed")]
    ReactionRemoved(ReactionEvent),
    #[serde(rename = "typing")]
    Typing(TypingEvent),
    #[serde(rename = "presence")]
    Presence(PresenceEvent),
    #[serde(rename = "meeting.started")]
    MeetingStarted(Meeting),
    #[serde(rename = "meeting.ended")]
    MeetingEnded(Meeting),
    /// A frame type this client does not know about.
    #[serde(skip)]
    Other {
        kind: String,
        payload: serde_json::Value,
    },
}

const KNOWN_TYPES: &[&str] = &[
    "notification",
    "message.created",
    "message.updated",
    "message.deleted",
    "reaction.added",
    "reaction.removed",
    "typing",
    "presence",
    "meeting.started",
    "meeting.ended",
];

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl ServerEvent {
    /// Parse a text frame.
    ///
    /// Unknown frame types decode as [`ServerEvent::Other`]; a known type with
    /// a payload of the wrong shape is an error.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(text)?;
        if !KNOWN_TYPES.contains(&raw.kind.as_str()) {
            return Ok(ServerEvent::Other {
                kind: raw.kind,
                payload: raw.payload,
            });
        }
        serde_json::from_str(text)
    }

    /// The frame's `type` discriminator.
    pub fn kind(&self) -> &str {
        match self {
            ServerEvent::Notification(_) => "notification",
            ServerEvent::MessageCreated(_) => "message.created",
            ServerEvent::MessageUpdated(_) => "message.updated",
            ServerEvent::MessageDeleted(_) => "message.deleted",
            ServerEvent::ReactionAdded(_) => "reaction.added",
            ServerEvent::ReactionRemoved(_) => "reaction.removed",
            ServerEvent::Typing(_) => "typing",
            ServerEvent::Presence(_) => "presence",
            ServerEvent::MeetingStarted(_) => "meeting.started",
            ServerEvent::MeetingEnded(_) => "meeting.ended",
            ServerEvent::Other { kind, .. } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_notification_frame() {
        let event = ServerEvent::from_json(
            r#"{"type":"notification","payload":{"id":"n1","type":"mention","title":"Hi","read":false,"createdAt":"2024-05-01T10:00:00Z"}}"#,
        )
        .unwrap();
        match &event {
            ServerEvent::Notification(n) => assert_eq!(n.id, "n1"),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(event.kind(), "notification");
    }

    #[test]
    fn unknown_types_are_preserved() {
        let event =
            ServerEvent::from_json(r#"{"type":"whiteboard.cursor","payload":{"x":1}}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::Other {
                kind: "whiteboard.cursor".into(),
                payload: serde_json::json!({"x": 1}),
            }
        );
    }

    #[test]
    fn known_type_with_bad_payload_is_rejected() {
        assert!(ServerEvent::from_json(r#"{"type":"notification","payload":{"id":1}}"#).is_err());
    }

    #[test]
    fn commands_serialize_with_type_tag() {
        let json = serde_json::to_value(WsEnvelope::new(ClientCommand::Subscribe {
            channel_id: "c1".into(),
        }))
        .unwrap();
        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["payload"]["channelId"], "c1");
        assert!(json["id"].is_string());

        let json = serde_json::to_value(ClientCommand::Ping).unwrap();
        assert_eq!(json, serde_json::json!({"type": "ping"}));
    }
}
