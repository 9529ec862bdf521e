//! Request handlers for the storage and location servers.

pub mod location;
pub mod storage;

use crate::error::{ApiError, ApiResult};
use axum::response::IntoResponse;
use axum::Json;
use model_catalog_bridge::types::PostBody;
use model_catalog_bridge::BridgeError;
use serde::Deserialize;
use serde_json::json;

/// The `?key=` query parameter shared by most endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

impl KeyQuery {
    /// The key, or a 400 if it is missing or empty.
    pub fn require(self) -> ApiResult<String> {
        match self.key {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ApiError(BridgeError::MissingParameter { name: "key".into() })),
        }
    }
}

/// Decode a `{"body": "<base64>"}` request body.
pub fn parse_post_body(raw: &[u8]) -> ApiResult<PostBody> {
    serde_json::from_slice(raw).map_err(|e| {
        ApiError(BridgeError::InvalidBody {
            message: e.to_string(),
        })
    })
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_require_key() {
        assert_eq!(
            KeyQuery { key: Some("ns_m".into()) }.require().unwrap(),
            "ns_m"
        );
        let err = KeyQuery { key: Some(String::new()) }.require().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(KeyQuery::default().require().is_err());
    }

    #[test]
    fn test_parse_post_body() {
        assert_eq!(parse_post_body(br#"{"body":"WA=="}"#).unwrap().body, b"X");
        assert!(parse_post_body(br#"{"body":null}"#).unwrap().body.is_empty());

        let err = parse_post_body(b"not json").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = parse_post_body(br#"{"body":"%%%"}"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
