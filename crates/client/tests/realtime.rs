mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{eventually, notification, TestServer, PASSWORD, SESSION};
use teamspace_client::queries::NotificationQueries;
use teamspace_client::ConnectionState;
use teamspace_shared::{LoginInput, Notification};

fn cached_ids(app: &teamspace_client::AppState) -> Vec<String> {
    app.queries()
        .get_query_data::<Vec<Notification>>(&NotificationQueries::key())
        .unwrap_or_default()
        .into_iter()
        .map(|n| n.id)
        .collect()
}

#[tokio::test]
async fn pushed_notification_is_merged_once() {
    let server = TestServer::start().await;
    server
        .state
        .notifications
        .lock()
        .unwrap()
        .push(notification("n1"));
    let app = server.app();
    app.notifications().list().await.unwrap();

    app.connect_realtime();
    assert!(eventually(|| async { app.connection_state() == ConnectionState::Open }).await);
    assert!(eventually(|| async { server.state.open_sockets() == 1 }).await);

    server.state.push("notification", notification("n2"));
    server.state.push("notification", notification("n2"));

    assert!(eventually(|| async { cached_ids(&app).len() == 2 }).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cached_ids(&app), vec!["n2", "n1"]);
    assert_eq!(app.notifications().unread_count(), 2);

    app.disconnect_realtime();
}

#[tokio::test]
async fn handshake_carries_the_session_cookie() {
    let server = TestServer::start().await;
    let app = server.app();
    app.auth()
        .login(&LoginInput {
            email: "ada@example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();

    app.connect_realtime();
    assert!(eventually(|| async { !server.state.ws_cookies.lock().unwrap().is_empty() }).await);
    let cookies = server.state.ws_cookies.lock().unwrap().clone();
    assert!(cookies[0].as_deref().is_some_and(|c| c.contains(SESSION)));

    app.disconnect_realtime();
}

#[tokio::test]
async fn unknown_frames_still_reach_subscribers() {
    let server = TestServer::start().await;
    let app = server.app();

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let seen = kinds.clone();
    let _sub = app
        .hub()
        .subscribe(move |event| seen.lock().unwrap().push(event.kind().to_string()));

    app.connect_realtime();
    assert!(eventually(|| async { server.state.open_sockets() == 1 }).await);
    server
        .state
        .push("whiteboard.cursor", serde_json::json!({ "x": 4, "y": 2 }));

    assert!(eventually(|| async { !kinds.lock().unwrap().is_empty() }).await);
    assert_eq!(kinds.lock().unwrap().as_slice(), ["whiteboard.cursor"]);

    app.disconnect_realtime();
}

#[tokio::test]
async fn disconnect_closes_the_socket() {
    let server = TestServer::start().await;
    let app = server.app();

    let handle = app.connect_realtime();
    assert!(eventually(|| async { server.state.open_sockets() == 1 }).await);

    app.disconnect_realtime();
    assert_eq!(app.connection_state(), ConnectionState::Closed);
    assert!(eventually(|| async { server.state.open_sockets() == 0 }).await);
    assert!(eventually(|| async { handle.is_closed() }).await);
}
