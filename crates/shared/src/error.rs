//! Client-facing error taxonomy for API calls.

use thiserror::Error;

/// Error raised by any API call.
///
/// `Clone` so a single failed request can be fanned out to every caller
/// awaiting the same in-flight query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, TLS, aborted body).
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a structured `{error: {code, message}}` envelope.
    #[error("{code}: {message} (HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    /// Non-success status without a structured error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// A success response whose body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Malformed(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Server error code for structured errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Best user-facing message: the server's message when present.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}
