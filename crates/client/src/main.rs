//! Teamspace Client - headless watcher
//!
//! Signs in (when `TEAMSPACE_EMAIL`/`TEAMSPACE_PASSWORD` are set), opens the
//! real-time connection and logs every pushed event until interrupted. Useful
//! for checking a deployment without the UI.

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use futures_util::StreamExt;
    use teamspace_client::{AppState, ClientConfig};
    use teamspace_shared::{LoginInput, ServerEvent};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("teamspace_client=debug")),
        )
        .init();

    let config = ClientConfig::from_env()?;
    let app = AppState::new(config).context("failed to build the client")?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("TEAMSPACE_EMAIL"),
        std::env::var("TEAMSPACE_PASSWORD"),
    ) {
        let user = app
            .auth()
            .login(&LoginInput { email, password })
            .await
            .context("login failed")?;
        tracing::info!("signed in as {} <{}>", user.name, user.email);
    } else {
        match app.auth().me().await {
            Ok(user) => tracing::info!("session belongs to {}", user.name),
            Err(e) if e.is_unauthorized() => tracing::warn!("no session; events may be refused"),
            Err(e) => return Err(e).context("could not reach the API"),
        }
    }

    // Keep the inbox cached so pushed notifications are merged and counted.
    if let Err(e) = app.notifications().list().await {
        tracing::warn!("could not load notifications: {}", e.user_message());
    }

    let _events = app.hub().subscribe(|event| match event {
        ServerEvent::Notification(n) => tracing::info!("notification: {}", n.title),
        ServerEvent::Typing(_) | ServerEvent::Presence(_) => {
            tracing::trace!("{}", event.kind())
        }
        other => tracing::info!("event: {}", other.kind()),
    });

    app.connect_realtime();
    if let Some(state) = app.connection_state_store() {
        let mut changes = state.changes();
        tokio::spawn(async move {
            while let Some(state) = changes.next().await {
                tracing::info!("connection {:?}", state);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!(
        "shutting down with {} unread notifications",
        app.notifications().unread_count()
    );
    app.disconnect_realtime();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
