//! Browser WebSocket transport using web_sys::WebSocket.
//!
//! The browser attaches the session cookie to the handshake itself.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::future::{select, Either};
use futures_util::{FutureExt, StreamExt};
use teamspace_shared::{ClientCommand, ServerEvent, WsEnvelope};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{js_sys, CloseEvent, MessageEvent, WebSocket};

use super::{wait_open, ConnectionState, Opening, Outgoing, ReconnectConfig, RealtimeHandle};
use crate::api_client::ApiClient;
use crate::realtime::EventHub;
use crate::stores::Store;

/// The app's WebSocket to the real-time endpoint (WASM implementation).
pub struct RealtimeConnection {
    state: Store<ConnectionState>,
    sender: UnboundedSender<Outgoing>,
    shutdown: Arc<AtomicBool>,
}

impl RealtimeConnection {
    /// Open the socket at the client's configured WebSocket URL and keep it
    /// open, reconnecting per `reconnect`.
    pub fn connect(api: &ApiClient, hub: EventHub, reconnect: ReconnectConfig) -> Self {
        let (sender, receiver) = unbounded();
        let state = Store::new(ConnectionState::Connecting);
        let shutdown = Arc::new(AtomicBool::new(false));

        spawn_local(run(
            api.config().ws_url.to_string(),
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

/// Socket events surfaced to the connection loop.
enum SocketEvent {
    Open,
    Closed(String),
}

/// A socket plus the JS callbacks that must outlive it.
struct Socket {
    ws: WebSocket,
    events: UnboundedReceiver<SocketEvent>,
    _callbacks: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        self.ws.set_onmessage(None);
    }
}

fn open_socket(url: &str, hub: &EventHub) -> Result<Socket, String> {
    let ws = WebSocket::new(url).map_err(|e| format!("failed to create WebSocket: {e:?}"))?;
    let (tx, events) = unbounded();

    let open_tx = tx.clone();
    let onopen = Closure::wrap(Box::new(move |_: JsValue| {
        let _ = open_tx.unbounded_send(SocketEvent::Open);
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

    let close_tx = tx.clone();
    let onclose = Closure::wrap(Box::new(move |e: JsValue| {
        let reason = match e.dyn_into::<CloseEvent>() {
            Ok(e) if !e.reason().is_empty() => e.reason(),
            Ok(e) => format!("code {}", e.code()),
            Err(_) => "closed".to_string(),
        };
        let _ = close_tx.unbounded_send(SocketEvent::Closed(reason));
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    let error_tx = tx;
    let onerror = Closure::wrap(Box::new(move |_: JsValue| {
        crate::log_error!("WebSocket onerror fired");
        let _ = error_tx.unbounded_send(SocketEvent::Closed("WebSocket error".to_string()));
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    let hub = hub.clone();
    let onmessage = Closure::wrap(Box::new(move |e: JsValue| {
        let Ok(e) = e.dyn_into::<MessageEvent>() else {
            return;
        };
        let Ok(text) = e.data().dyn_into::<js_sys::JsString>() else {
            return;
        };
        let text: String = text.into();
        match ServerEvent::from_json(&text) {
            Ok(event) => {
                crate::log_debug!("received {} event", event.kind());
                hub.publish(event);
            }
            Err(e) => crate::log_warn!("skipping unreadable frame: {}", e),
        }
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    Ok(Socket {
        ws,
        events,
        _callbacks: vec![onopen, onclose, onerror, onmessage],
    })
}

fn send_frame(ws: &WebSocket, envelope: &WsEnvelope<ClientCommand>) -> bool {
    match serde_json::to_string(envelope) {
        Ok(json) => match ws.send_with_str(&json) {
            Ok(()) => true,
            Err(e) => {
                crate::log_error!("send failed: {:?}", e);
                false
            }
        },
        Err(e) => {
            crate::log_error!("failed to serialize command: {}", e);
            true
        }
    }
}

enum Ended {
    Dropped,
    Shutdown,
}

async fn session(
    mut socket: Socket,
    receiver: &mut UnboundedReceiver<Outgoing>,
    pending: &mut VecDeque<WsEnvelope<ClientCommand>>,
) -> Ended {
    while let Some(envelope) = pending.pop_front() {
        if !send_frame(&socket.ws, &envelope) {
            pending.push_front(envelope);
            return Ended::Dropped;
        }
    }

    loop {
        match select(socket.events.next(), receiver.next()).await {
            Either::Left((Some(SocketEvent::Open), _)) => {}
            Either::Left((Some(SocketEvent::Closed(reason)), _)) => {
                crate::log_info!("WebSocket closed: {}", reason);
                return Ended::Dropped;
            }
            Either::Left((None, _)) => return Ended::Dropped,
            Either::Right((Some(Outgoing::Frame(envelope)), _)) => {
                if !send_frame(&socket.ws, &envelope) {
                    pending.push_back(envelope);
                    return Ended::Dropped;
                }
            }
            Either::Right((Some(Outgoing::Close) | None, _)) => {
                let _ = socket.ws.close();
                return Ended::Shutdown;
            }
        }
    }
}

async fn run(
    url: String,
    hub: EventHub,
    reconnect: ReconnectConfig,
    state: Store<ConnectionState>,
    mut receiver: UnboundedReceiver<Outgoing>,
    shutdown: Arc<AtomicBool>,
) {
    let mut attempt = 0u32;
    let mut pending = VecDeque::new();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        state.set(ConnectionState::Connecting);

        let opened = match open_socket(&url, &hub) {
            Ok(mut socket) => {
                let opening = socket.events.next().map(|event| match event {
                    Some(SocketEvent::Open) => Ok(()),
                    Some(SocketEvent::Closed(reason)) => Err(reason),
                    None => Err("socket dropped before opening".to_string()),
                });
                match wait_open(opening, &mut receiver, &mut pending).await {
                    Opening::Open(()) => Ok(socket),
                    Opening::Failed(reason) => Err(reason),
                    Opening::Shutdown => {
                        let _ = socket.ws.close();
                        break;
                    }
                }
            }
            Err(e) => Err(e),
        };

        match opened {
            Ok(socket) => {
                state.set(ConnectionState::Open);
                attempt = 0;
                crate::log_info!("WebSocket connected to {}", url);

                let ended = session(socket, &mut receiver, &mut pending).await;
                state.set(ConnectionState::Closed);
                if matches!(ended, Ended::Shutdown) || shutdown.load(Ordering::SeqCst) {
                    break;
                }
            }
            Err(reason) => {
                crate::log_error!("WebSocket error for {}: {}", url, reason);
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

        let mut sleep = Box::pin(crate::platform::sleep(delay));
        let closed = loop {
            match select(&mut sleep, receiver.next()).await {
                Either::Left(_) => break false,
                Either::Right((Some(Outgoing::Frame(envelope)), _)) => pending.push_back(envelope),
                Either::Right((Some(Outgoing::Close) | None, _)) => break true,
            }
        };
        if closed {
            break;
        }
    }

    state.set(ConnectionState::Closed);
    crate::log_info!("real-time connection to {} stopped", url);
}
