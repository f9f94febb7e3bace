//! Real-time channel: one WebSocket per app, fanned out through an
//! [`EventHub`].

mod connection;
mod hub;

pub use connection::{ConnectionState, RealtimeConnection, RealtimeError, RealtimeHandle, ReconnectConfig};
pub use hub::{EventCallback, EventHub, Subscription, DEFAULT_EVENT_BUFFER};
