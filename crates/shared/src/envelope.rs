//! Uniform response envelope: `{"data": T}` on success, `{"error": {code, message}}` on failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Structured error body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Wire shape of every API response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// Decode a response body into its payload.
///
/// Success bodies that are empty or lack `data` decode as JSON `null`, which
/// is valid for `()` and `Option<_>` payloads and malformed otherwise.
/// Failed bodies become [`ApiError::Api`] when they carry a structured error
/// and [`ApiError::Http`] when they do not.
pub fn decode_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    let is_success = (200..300).contains(&status);

    if !is_success {
        return Err(match parse_error_body(body) {
            Some(ErrorBody { code, message }) => ApiError::Api {
                status,
                code,
                message,
            },
            None => ApiError::Http {
                status,
                body: body.to_string(),
            },
        });
    }

    if body.trim().is_empty() {
        return null_payload();
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
    let serde_json::Value::Object(mut map) = value else {
        return Err(ApiError::Malformed("response body is not an envelope object".into()));
    };

    match map.remove("data") {
        Some(data) => serde_json::from_value(data).map_err(|e| ApiError::Malformed(e.to_string())),
        None => null_payload(),
    }
}

/// Pull a structured error out of a body, if there is one.
pub fn parse_error_body(body: &str) -> Option<ErrorBody> {
    let envelope = serde_json::from_str::<Envelope<serde_json::Value>>(body).ok()?;
    envelope.error
}

fn null_payload<T: DeserializeOwned>() -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::Null)
        .map_err(|_| ApiError::Malformed("response envelope is missing `data`".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_data() {
        let ids: Vec<String> = decode_body(200, r#"{"data":["a","b"]}"#).unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn structured_error_becomes_api_error() {
        let err = decode_body::<()>(
            422,
            r#"{"error":{"code":"VALIDATION","message":"title is required"}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ApiError::Api {
                status: 422,
                code: "VALIDATION".into(),
                message: "title is required".into(),
            }
        );
    }

    #[test]
    fn unstructured_failure_is_generic() {
        let err = decode_body::<()>(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 502,
                body: "<html>Bad Gateway</html>".into(),
            }
        );
    }

    #[test]
    fn empty_success_body_only_fits_unit_like_payloads() {
        decode_body::<()>(204, "").unwrap();
        assert_eq!(decode_body::<Option<u32>>(200, r#"{"data":null}"#).unwrap(), None);
        assert!(matches!(
            decode_body::<Vec<u32>>(200, "{}"),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn non_envelope_success_is_malformed() {
        assert!(matches!(
            decode_body::<u32>(200, "[1,2,3]"),
            Err(ApiError::Malformed(_))
        ));
        assert!(matches!(
            decode_body::<u32>(200, r#"{"data":"seven"}"#),
            Err(ApiError::Malformed(_))
        ));
    }
}
