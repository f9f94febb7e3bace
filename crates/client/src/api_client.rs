//! HTTP client for the Teamspace REST API.
//!
//! Every response body is an envelope (`{data}` / `{error}`); this client
//! unwraps it and maps failures onto [`ApiError`]. One attempt per call, no
//! retries.

#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use teamspace_shared::{decode_body, ApiError};

use crate::config::ClientConfig;

/// Session-aware HTTP client. Cheap to clone; clones share the connection
/// pool and the session cookie jar.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    #[cfg(not(target_arch = "wasm32"))]
    jar: Arc<reqwest::cookie::Jar>,
}

impl ApiClient {
    /// Create a client for the configured API.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let jar = Arc::new(reqwest::cookie::Jar::default());
            let client = Client::builder()
                .cookie_provider(jar.clone())
                .build()
                .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
            Ok(Self {
                client,
                config: config.clone(),
                jar,
            })
        }

        #[cfg(target_arch = "wasm32")]
        {
            Ok(Self {
                client: Client::new(),
                config: config.clone(),
            })
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// `Cookie` header the session jar would send to `url`.
    ///
    /// The WebSocket handshake is not issued through reqwest, so the transport
    /// asks for the session cookie here.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn cookie_header(&self, url: &url::Url) -> Option<reqwest::header::HeaderValue> {
        use reqwest::cookie::CookieStore;

        let mut http_url = url.clone();
        let scheme = match url.scheme() {
            "wss" => "https",
            "ws" => "http",
            other => other,
        }
        .to_string();
        // `set_scheme` refuses some special-scheme transitions; fall back to the
        // original URL, which the jar still matches on host.
        let _ = http_url.set_scheme(&scheme);
        self.jar.cookies(&http_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let rb = self.client.request(method, self.url(path));
        #[cfg(target_arch = "wasm32")]
        let rb = rb.fetch_credentials_include();
        rb
    }

    async fn send<TRes: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<TRes, ApiError> {
        let request = rb.build().map_err(|e| ApiError::Network(e.to_string()))?;
        let method = request.method().clone();
        let url = request.url().to_string();

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        crate::log_debug!("{} {} -> {}", method, url, status);

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        decode_body(status, &text)
    }

    fn with_json<TReq: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
    ) -> Result<RequestBuilder, ApiError> {
        let body_bytes =
            serde_json::to_vec(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        Ok(self
            .request(method, path)
            .header("Content-Type", "application/json")
            .body(body_bytes))
    }

    /// GET and unwrap the envelope.
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    /// POST a JSON body.
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = self.with_json(Method::POST, path, body)?;
        self.send(rb).await
    }

    /// POST without a body.
    pub async fn post_empty<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        self.send(self.request(Method::POST, path)).await
    }

    /// PUT a JSON body.
    pub async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = self.with_json(Method::PUT, path, body)?;
        self.send(rb).await
    }

    /// PATCH a JSON body.
    pub async fn patch_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = self.with_json(Method::PATCH, path, body)?;
        self.send(rb).await
    }

    /// DELETE; the payload, if any, is discarded.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(self.request(Method::DELETE, path))
            .await
            .map(|_| ())
    }

    /// DELETE that never fails. Used for cleanup where the caller has nothing
    /// to do with an error.
    pub async fn delete_best_effort(&self, path: &str) {
        if let Err(e) = self.delete(path).await {
            crate::log_debug!("best-effort DELETE {} ignored: {}", path, e);
        }
    }

    /// POST a multipart form.
    pub async fn post_multipart<TRes: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<TRes, ApiError> {
        self.send(self.request(Method::POST, path).multipart(form))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_resolved_against_the_api_root() {
        let config = ClientConfig::new("http://localhost:3000/api/v1").unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/docs"), "http://localhost:3000/api/v1/docs");
    }

    #[test]
    fn cookie_header_is_empty_without_a_session() {
        let config = ClientConfig::new("http://localhost:3000/api/v1").unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert!(client.cookie_header(&config.ws_url).is_none());
    }
}
