//! Native WebSocket transport using tokio-tungstenite.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{FutureExt, SinkExt, StreamExt};
use teamspace_shared::{ClientCommand, ServerEvent, WsEnvelope};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{wait_open, ConnectionState, Opening, Outgoing, ReconnectConfig, RealtimeHandle};
use crate::api_client::ApiClient;
use crate::realtime::EventHub;
use crate::stores::Store;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// The app's WebSocket to the real-time endpoint (native implementation).
///
/// Inbound frames are published to the [`EventHub`]; dropping the connection
/// closes it.
pub struct RealtimeConnection {
    state: Store<ConnectionState>,
    sender: UnboundedSender<Outgoing>,
    shutdown: Arc<AtomicBool>,
}

impl RealtimeConnection {
    /// Open the socket at the client's configured WebSocket URL and keep it
    /// open, reconnecting per `reconnect`. Must be called inside a tokio
    /// runtime.
    ///
    /// The session cookie is read from `api` on every attempt so a fresh
    /// login is picked up on reconnect.
    pub fn connect(api: &ApiClient, hub: EventHub, reconnect: ReconnectConfig) -> Self {
        let (sender, receiver) = unbounded();
        let state = Store::new(ConnectionState::Connecting);
        let shutdown = Arc::new(AtomicBool::new(false));

        tokio::spawn(run(
            api.clone(),
            hub,
            reconnect,
            state.clone(),
            receiver,
            shutdown.clone(),
        ));

        Self {
            state,
            sender,
            shutdown,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Observable connection state.
    pub fn state_store(&self) -> Store<ConnectionState> {
        self.state.clone()
    }

    pub fn handle(&self) -> RealtimeHandle {
        RealtimeHandle::new(self.sender.clone())
    }

    /// Close the socket and stop reconnecting.
    pub fn close(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            crate::log_info!("closing real-time connection");
            let _ = self.sender.unbounded_send(Outgoing::Close);
        }
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RealtimeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConnection")
            .field("state", &self.state())
            .finish()
    }
}

fn handshake_request(api: &ApiClient) -> Result<Request, tokio_tungstenite::tungstenite::Error> {
    let url = &api.config().ws_url;
    let mut request = url.as_str().into_client_request()?;
    if let Some(cookie) = api.cookie_header(url) {
        request.headers_mut().insert(COOKIE, cookie);
    }
    Ok(request)
}

fn dispatch(hub: &EventHub, text: &str) {
    match ServerEvent::from_json(text) {
        Ok(event) => {
            crate::log_debug!("received {} event", event.kind());
            hub.publish(event);
        }
        Err(e) => crate::log_warn!("skipping unreadable frame: {}", e),
    }
}

/// Write one command frame. Returns `false` when the socket is unusable.
async fn send_frame<S>(write: &mut S, envelope: &WsEnvelope<ClientCommand>) -> bool
where
    S: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = match serde_json::to_string(envelope) {
        Ok(json) => json,
        Err(e) => {
            crate::log_error!("failed to serialize command: {}", e);
            return true;
        }
    };
    match write.send(Message::Text(json.into())).await {
        Ok(()) => true,
        Err(e) => {
            crate::log_error!("send failed: {}", e);
            false
        }
    }
}

/// How a live socket ended.
enum Ended {
    Dropped,
    Shutdown,
}

/// Pump one open socket until it drops or the connection is closed.
async fn session(
    ws_stream: WsStream,
    hub: &EventHub,
    receiver: &mut UnboundedReceiver<Outgoing>,
    pending: &mut VecDeque<WsEnvelope<ClientCommand>>,
) -> Ended {
    let (mut write, mut read) = ws_stream.split();

    while let Some(envelope) = pending.pop_front() {
        if !send_frame(&mut write, &envelope).await {
            pending.push_front(envelope);
            return Ended::Dropped;
        }
    }

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => dispatch(hub, &text),
                Some(Ok(Message::Close(_))) | None => {
                    crate::log_info!("WebSocket closed by server");
                    return Ended::Dropped;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    crate::log_error!("WebSocket read error: {}", e);
                    return Ended::Dropped;
                }
            },
            outgoing = receiver.next() => match outgoing {
                Some(Outgoing::Frame(envelope)) => {
                    if !send_frame(&mut write, &envelope).await {
                        pending.push_back(envelope);
                        return Ended::Dropped;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ended::Shutdown;
                }
            },
        }
    }
}

async fn run(
    api: ApiClient,
    hub: EventHub,
    reconnect: ReconnectConfig,
    state: Store<ConnectionState>,
    mut receiver: UnboundedReceiver<Outgoing>,
    shutdown: Arc<AtomicBool>,
) {
    let url = api.config().ws_url.clone();
    let mut attempt = 0u32;
    // Commands queued while no socket was open.
    let mut pending = VecDeque::new();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        state.set(ConnectionState::Connecting);

        let request = match handshake_request(&api) {
            Ok(request) => request,
            Err(e) => {
                crate::log_error!("invalid WebSocket URL {}: {}", url, e);
                break;
            }
        };

        let connecting = connect_async(request)
            .map(|result| result.map(|(ws_stream, _response)| ws_stream).map_err(|e| e.to_string()));
        match wait_open(connecting, &mut receiver, &mut pending).await {
            Opening::Open(ws_stream) => {
                state.set(ConnectionState::Open);
                attempt = 0;
                crate::log_info!("WebSocket connected to {}", url);

                let ended = session(ws_stream, &hub, &mut receiver, &mut pending).await;
                state.set(ConnectionState::Closed);
                if matches!(ended, Ended::Shutdown) || shutdown.load(Ordering::SeqCst) {
                    break;
                }
            }
            Opening::Shutdown => break,
            Opening::Failed(e) => {
                crate::log_error!("WebSocket error for {}: {}", url, e);
                state.set(ConnectionState::Closed);
                if !reconnect.allows(attempt) {
                    crate::log_error!(
                        "giving up on {} after {} attempts",
                        url,
                        reconnect.max_attempts
                    );
                    break;
                }
            }
        }

        let delay = reconnect.delay_for_attempt(attempt);
        crate::log_info!(
            "reconnecting to {} in {}ms (attempt {})",
            url,
            delay.as_millis(),
            attempt + 1
        );
        attempt += 1;

        // Keep queueing commands during the backoff, but wake early on close.
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        let closed = loop {
            tokio::select! {
                _ = &mut sleep => break false,
                outgoing = receiver.next() => match outgoing {
                    Some(Outgoing::Frame(envelope)) => pending.push_back(envelope),
                    Some(Outgoing::Close) | None => break true,
                },
            }
        };
        if closed {
            break;
        }
    }

    state.set(ConnectionState::Closed);
    crate::log_info!("real-time connection to {} stopped", url);
}
