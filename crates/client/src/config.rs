//! Client configuration.

use url::Url;

use crate::realtime::ReconnectConfig;

/// Default API root, versioned path included.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

/// Where and how the client talks to the Teamspace API.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// REST base, e.g. `https://teamspace.example.com/api/v1`.
    pub api_url: Url,
    /// WebSocket endpoint, e.g. `wss://teamspace.example.com/ws`.
    pub ws_url: Url,
    pub reconnect: ReconnectConfig,
    /// Events held by the hub while nobody is subscribed.
    pub event_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid client configuration: {0}")]
pub struct ConfigError(pub String);

impl ClientConfig {
    /// Build a config for an API root; the WebSocket URL is derived from it.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_base(api_url)?;
        let ws_url = derive_ws_url(&api_url)?;
        Ok(Self {
            api_url,
            ws_url,
            reconnect: ReconnectConfig::default(),
            event_buffer: crate::realtime::DEFAULT_EVENT_BUFFER,
        })
    }

    pub fn with_ws_url(mut self, ws_url: &str) -> Result<Self, ConfigError> {
        self.ws_url = Url::parse(ws_url).map_err(|e| ConfigError(format!("{ws_url}: {e}")))?;
        Ok(self)
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Read configuration from the environment.
    ///
    /// Environment variables:
    /// - `TEAMSPACE_API_URL`: REST base (default: `http://localhost:3000/api/v1`)
    /// - `TEAMSPACE_WS_URL`: WebSocket endpoint (default: derived from the API URL)
    /// - `TEAMSPACE_RECONNECT_ATTEMPTS`: max reconnect attempts, 0 = unlimited (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url =
            std::env::var("TEAMSPACE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&api_url)?;

        if let Ok(ws_url) = std::env::var("TEAMSPACE_WS_URL") {
            config = config.with_ws_url(&ws_url)?;
        }

        if let Ok(attempts) = std::env::var("TEAMSPACE_RECONNECT_ATTEMPTS") {
            config.reconnect.max_attempts = attempts.trim().parse().map_err(|_| {
                ConfigError(format!("TEAMSPACE_RECONNECT_ATTEMPTS={attempts} is not a number"))
            })?;
        }

        Ok(config)
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.api_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError(format!("unsupported API scheme `{other}`"))),
    }
}

/// `http(s)://host/api/v1` -> `ws(s)://host/ws`
fn derive_ws_url(api_url: &Url) -> Result<Url, ConfigError> {
    let scheme = if api_url.scheme() == "https" { "wss" } else { "ws" };
    let host = api_url
        .host_str()
        .ok_or_else(|| ConfigError(format!("{api_url} has no host")))?;
    let raw = match api_url.port() {
        Some(port) => format!("{scheme}://{host}:{port}/ws"),
        None => format!("{scheme}://{host}/ws"),
    };
    Url::parse(&raw).map_err(|e| ConfigError(format!("{raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ws_endpoint_from_api_origin() {
        let config = ClientConfig::new("https://teamspace.example.com/api/v1").unwrap();
        assert_eq!(config.ws_url.as_str(), "wss://teamspace.example.com/ws");

        let config = ClientConfig::new("http://127.0.0.1:8080/api/v1/").unwrap();
        assert_eq!(config.ws_url.as_str(), "ws://127.0.0.1:8080/ws");
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = ClientConfig::new("http://localhost:3000/api/v1/").unwrap();
        assert_eq!(
            config.endpoint("/projects/p1"),
            "http://localhost:3000/api/v1/projects/p1"
        );
        assert_eq!(config.endpoint("me"), "http://localhost:3000/api/v1/me");
        assert_eq!(
            config.endpoint("https://cdn.example.com/f.png"),
            "https://cdn.example.com/f.png"
        );
    }

    #[test]
    fn rejects_non_http_api_urls() {
        assert!(ClientConfig::new("ftp://example.com").is_err());
        assert!(ClientConfig::new("not a url").is_err());
    }
}
