//! WebSocket connection with state tracking and auto-reconnect.
//!
//! Shared types live here; the transport is picked per target.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures_util::future::{select, Either};
use futures_util::StreamExt;
use teamspace_shared::{ClientCommand, WsEnvelope};

/// Lifecycle of the real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failed attempts (0 = infinite)
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u32,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before reconnect attempt number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        let delay = (delay as u32).min(self.max_delay_ms);
        Duration::from_millis(delay as u64)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts == 0 || attempt < self.max_attempts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    #[error("real-time connection is closed")]
    Closed,
}

/// Commands queued for the connection's writer.
#[derive(Debug)]
pub(crate) enum Outgoing {
    Frame(WsEnvelope<ClientCommand>),
    Close,
}

/// How an attempt to open the socket ended.
pub(crate) enum Opening<T> {
    Open(T),
    Failed(String),
    Shutdown,
}

/// Drive `opening` to completion while commands keep queueing into
/// `pending`. A close request aborts the attempt.
pub(crate) async fn wait_open<F, T>(
    opening: F,
    receiver: &mut UnboundedReceiver<Outgoing>,
    pending: &mut VecDeque<WsEnvelope<ClientCommand>>,
) -> Opening<T>
where
    F: Future<Output = Result<T, String>>,
{
    let mut opening = std::pin::pin!(opening);
    loop {
        match select(opening.as_mut(), receiver.next()).await {
            Either::Left((Ok(value), _)) => return Opening::Open(value),
            Either::Left((Err(reason), _)) => return Opening::Failed(reason),
            Either::Right((Some(Outgoing::Frame(envelope)), _)) => pending.push_back(envelope),
            Either::Right((Some(Outgoing::Close) | None, _)) => return Opening::Shutdown,
        }
    }
}

/// Handle for sending commands through the connection.
///
/// Commands queued while the socket is reconnecting are sent once it opens.
#[derive(Debug, Clone)]
pub struct RealtimeHandle {
    sender: UnboundedSender<Outgoing>,
}

impl RealtimeHandle {
    pub(crate) fn new(sender: UnboundedSender<Outgoing>) -> Self {
        Self { sender }
    }

    pub fn send(&self, cmd: ClientCommand) -> Result<(), RealtimeError> {
        crate::log_debug!("queueing {:?}", cmd);
        self.sender
            .unbounded_send(Outgoing::Frame(WsEnvelope::new(cmd)))
            .map_err(|_| RealtimeError::Closed)
    }

    /// Start receiving events for a channel.
    pub fn subscribe(&self, channel_id: &str) -> Result<(), RealtimeError> {
        self.send(ClientCommand::Subscribe {
            channel_id: channel_id.to_string(),
        })
    }

    pub fn unsubscribe(&self, channel_id: &str) -> Result<(), RealtimeError> {
        self.send(ClientCommand::Unsubscribe {
            channel_id: channel_id.to_string(),
        })
    }

    pub fn typing(&self, channel_id: &str) -> Result<(), RealtimeError> {
        self.send(ClientCommand::Typing {
            channel_id: channel_id.to_string(),
        })
    }

    pub fn ping(&self) -> Result<(), RealtimeError> {
        self.send(ClientCommand::Ping)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(target_arch = "wasm32")]
mod connection_wasm;
#[cfg(target_arch = "wasm32")]
pub use connection_wasm::RealtimeConnection;

#[cfg(not(target_arch = "wasm32"))]
mod connection_native;
#[cfg(not(target_arch = "wasm32"))]
pub use connection_native::RealtimeConnection;

#[cfg(test)]
mod tests {
    use super::*;
    use futures_channel::mpsc::unbounded;

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1500));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(2250));
        assert_eq!(config.delay_for_attempt(20), Duration::from_millis(30000));
    }

    #[test]
    fn zero_max_attempts_is_unlimited() {
        let limited = ReconnectConfig::default();
        assert!(limited.allows(9));
        assert!(!limited.allows(10));

        let unlimited = ReconnectConfig {
            max_attempts: 0,
            ..ReconnectConfig::default()
        };
        assert!(unlimited.allows(10_000));
    }

    #[test]
    fn handle_wraps_commands_in_envelopes() {
        let (tx, mut rx) = unbounded();
        let handle = RealtimeHandle::new(tx);
        handle.subscribe("c1").unwrap();

        match rx.try_next().unwrap() {
            Some(Outgoing::Frame(envelope)) => {
                assert_eq!(
                    envelope.payload,
                    ClientCommand::Subscribe {
                        channel_id: "c1".into()
                    }
                );
                assert!(!envelope.id.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_aborts_an_opening_socket() {
        let (tx, mut rx) = unbounded();
        let handle = RealtimeHandle::new(tx.clone());
        let mut pending = VecDeque::new();

        handle.ping().unwrap();
        tx.unbounded_send(Outgoing::Close).unwrap();
        let never_opens = futures_util::future::pending::<Result<(), String>>();

        let opening = wait_open(never_opens, &mut rx, &mut pending).await;
        assert!(matches!(opening, Opening::Shutdown));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload, ClientCommand::Ping);
    }

    #[tokio::test]
    async fn opening_reports_the_socket_or_the_failure() {
        let (_tx, mut rx) = unbounded::<Outgoing>();
        let mut pending = VecDeque::new();

        let opened = wait_open(async { Ok::<_, String>(7) }, &mut rx, &mut pending).await;
        assert!(matches!(opened, Opening::Open(7)));

        let failed = wait_open(
            async { Err::<(), _>("connection refused".to_string()) },
            &mut rx,
            &mut pending,
        )
        .await;
        assert!(matches!(failed, Opening::Failed(reason) if reason == "connection refused"));
    }

    #[test]
    fn send_fails_once_the_connection_is_gone() {
        let (tx, rx) = unbounded();
        let handle = RealtimeHandle::new(tx);
        drop(rx);
        assert_eq!(handle.ping(), Err(RealtimeError::Closed));
        assert!(handle.is_closed());
    }
}
