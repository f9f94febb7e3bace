//! In-process Teamspace API used by the integration tests.
//!
//! Serves a handful of REST routes under `/api/v1` with the usual envelope,
//! a cookie session, and `/ws`, which forwards whatever the test pushes into
//! [`ServerState::push`] to every connected socket.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use teamspace_client::storage::MemoryStorage;
use teamspace_client::{AppState, ClientConfig};
use tokio::sync::broadcast;

pub const SESSION: &str = "sid=test-session";
pub const PASSWORD: &str = "correct horse";

#[derive(Clone)]
pub struct ServerState {
    pub project_list_hits: Arc<AtomicUsize>,
    pub notification_list_hits: Arc<AtomicUsize>,
    pub projects: Arc<Mutex<Vec<Value>>>,
    pub files: Arc<Mutex<Vec<String>>>,
    pub notifications: Arc<Mutex<Vec<Value>>>,
    /// `Cookie` header of every WebSocket handshake, in order.
    pub ws_cookies: Arc<Mutex<Vec<Option<String>>>>,
    frames: broadcast::Sender<String>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            project_list_hits: Arc::new(AtomicUsize::new(0)),
            notification_list_hits: Arc::new(AtomicUsize::new(0)),
            projects: Arc::new(Mutex::new(Vec::new())),
            files: Arc::new(Mutex::new(Vec::new())),
            notifications: Arc::new(Mutex::new(Vec::new())),
            ws_cookies: Arc::new(Mutex::new(Vec::new())),
            frames: broadcast::channel(64).0,
        }
    }

    /// Send a `{type, payload}` frame to every open socket.
    pub fn push(&self, kind: &str, payload: Value) {
        let frame = json!({ "type": kind, "payload": payload }).to_string();
        let _ = self.frames.send(frame);
    }

    pub fn open_sockets(&self) -> usize {
        self.frames.receiver_count()
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: ServerState,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = ServerState::new();
        let router = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/logout", post(logout))
            .route("/api/v1/auth/me", get(me))
            .route("/api/v1/projects", get(list_projects).post(create_project))
            .route("/api/v1/projects/{id}", get(get_project))
            .route("/api/v1/notifications", get(list_notifications))
            .route("/api/v1/notifications/read-all", post(mark_all_notifications_read))
            .route("/api/v1/notifications/{id}/read", post(mark_notification_read))
            .route("/api/v1/files", post(upload_file))
            .route("/api/v1/files/{id}", delete(delete_file))
            .route("/api/v1/broken", get(broken))
            .route("/ws", get(ws_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&format!("http://{}/api/v1", self.addr)).unwrap();
        config.reconnect.initial_delay_ms = 50;
        config.reconnect.max_delay_ms = 200;
        config
    }

    pub fn app(&self) -> AppState {
        AppState::with_storage(self.config(), Arc::new(MemoryStorage::default())).unwrap()
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

pub fn user() -> Value {
    json!({
        "id": "u1",
        "email": "ada@example.com",
        "name": "Ada",
        "createdAt": "2024-05-01T10:00:00Z",
    })
}

pub fn notification(id: &str) -> Value {
    json!({
        "id": id,
        "type": "mention",
        "title": format!("notification {id}"),
        "read": false,
        "createdAt": "2024-05-01T12:00:00Z",
    })
}

fn data(value: Value) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(SESSION))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "wrong password");
    }
    let mut response = data(user());
    response.headers_mut().insert(
        header::SET_COOKIE,
        format!("{SESSION}; Path=/; HttpOnly").parse().unwrap(),
    );
    response
}

async fn logout() -> Response {
    let mut response = data(Value::Null);
    response
        .headers_mut()
        .insert(header::SET_COOKIE, "sid=; Path=/; Max-Age=0".parse().unwrap());
    response
}

async fn me(headers: HeaderMap) -> Response {
    if has_session(&headers) {
        data(user())
    } else {
        error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "not signed in")
    }
}

async fn list_projects(State(state): State<ServerState>) -> Response {
    state.project_list_hits.fetch_add(1, Ordering::SeqCst);
    // Long enough for concurrent readers to overlap.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let projects = state.projects.lock().unwrap().clone();
    data(Value::Array(projects))
}

async fn create_project(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    let mut projects = state.projects.lock().unwrap();
    let project = json!({
        "id": format!("p{}", projects.len() + 1),
        "name": body["name"],
        "ownerId": "u1",
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z",
    });
    projects.push(project.clone());
    data(project)
}

async fn get_project(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    let projects = state.projects.lock().unwrap();
    match projects.iter().find(|p| p["id"] == id.as_str()) {
        Some(project) => data(project.clone()),
        None => error(StatusCode::NOT_FOUND, "NOT_FOUND", "no such project"),
    }
}

async fn list_notifications(State(state): State<ServerState>) -> Response {
    state.notification_list_hits.fetch_add(1, Ordering::SeqCst);
    data(Value::Array(state.notifications.lock().unwrap().clone()))
}

async fn mark_notification_read(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    let mut notifications = state.notifications.lock().unwrap();
    match notifications.iter_mut().find(|n| n["id"] == id.as_str()) {
        Some(notification) => {
            notification["read"] = Value::Bool(true);
            data(Value::Null)
        }
        None => error(StatusCode::NOT_FOUND, "NOT_FOUND", "no such notification"),
    }
}

async fn mark_all_notifications_read(State(state): State<ServerState>) -> Response {
    for notification in state.notifications.lock().unwrap().iter_mut() {
        notification["read"] = Value::Bool(true);
    }
    data(Value::Null)
}

async fn upload_file(State(state): State<ServerState>, mut multipart: Multipart) -> Response {
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.unwrap();

        let mut files = state.files.lock().unwrap();
        let id = format!("f{}", files.len() + 1);
        files.push(id.clone());
        return data(json!({
            "id": id,
            "name": name,
            "mimeType": mime,
            "size": bytes.len(),
            "createdAt": "2024-05-01T10:00:00Z",
        }));
    }
    error(StatusCode::BAD_REQUEST, "NO_FILE", "missing `file` part")
}

async fn delete_file(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    let mut files = state.files.lock().unwrap();
    match files.iter().position(|f| *f == id) {
        Some(pos) => {
            files.remove(pos);
            data(Value::Null)
        }
        None => error(StatusCode::NOT_FOUND, "NOT_FOUND", "no such file"),
    }
}

async fn broken() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream exploded").into_response()
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<ServerState>,
) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.ws_cookies.lock().unwrap().push(cookie);
    let frames = state.frames.subscribe();
    ws.on_upgrade(move |socket| forward(socket, frames))
}

async fn forward(mut socket: WebSocket, mut frames: broadcast::Receiver<String>) {
    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if socket.send(WsMessage::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
