//! Shared reqwest plumbing for the service clients.

use model_catalog_bridge::config::BridgeDefaults;
use model_catalog_bridge::{BridgeError, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Connection settings common to every client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total timeout per request.
    pub timeout: Duration,
    /// Bearer token sent with every request, if any.
    pub token: Option<String>,
    /// Accept invalid TLS certificates (self-signed test clusters).
    pub skip_tls_verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: BridgeDefaults::REQUEST_TIMEOUT,
            token: None,
            skip_tls_verify: false,
        }
    }
}

impl ClientConfig {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build a reqwest client from `config`.
pub(crate) fn build_client(config: &ClientConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(BridgeDefaults::USER_AGENT)
        .danger_accept_invalid_certs(config.skip_tls_verify)
        .build()
        .map_err(|e| BridgeError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            cause: None,
        })
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Send a request, attaching the bearer token and mapping transport failures.
pub(crate) async fn send(
    service: &str,
    request: RequestBuilder,
    token: Option<&str>,
) -> Result<Response> {
    let request = match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    };
    request.send().await.map_err(|e| BridgeError::Network {
        message: format!("request to {} failed", service),
        cause: Some(e.to_string()),
    })
}

/// Turn a non-success response into [`BridgeError::UpstreamStatus`].
pub(crate) async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BridgeError::UpstreamStatus {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    service: &str,
    response: Response,
) -> Result<T> {
    response.json().await.map_err(|e| BridgeError::Network {
        message: format!("Failed to parse {} response", service),
        cause: Some(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_dropped() {
        assert!(ClientConfig::default().with_token("").token.is_none());
        assert_eq!(
            ClientConfig::default().with_token("abc").token.as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(normalize_base_url("http://a:1/"), "http://a:1");
        assert_eq!(normalize_base_url("http://a:1"), "http://a:1");
    }

    #[test]
    fn test_build_client_with_tls_skip() {
        let config = ClientConfig::default()
            .with_skip_tls_verify(true)
            .with_timeout(Duration::from_secs(1));
        assert!(build_client(&config).is_ok());
    }
}
