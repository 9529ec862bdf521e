//! Client the bridge core uses to publish documents to the location service.

use crate::http::{build_client, ensure_success, normalize_base_url, read_json, send, ClientConfig};
use async_trait::async_trait;
use model_catalog_bridge::config::Routes;
use model_catalog_bridge::types::{DiscoveryResponse, PostBody};
use model_catalog_bridge::{LocationService, Result, UpsertOutcome};
use reqwest::{Client, StatusCode};
use tracing::debug;

const SERVICE: &str = "location service";

/// HTTP client for a remote location service.
pub struct LocationServiceClient {
    host_url: String,
    client: Client,
    token: Option<String>,
}

impl LocationServiceClient {
    /// `host_url` is both where requests go and the base the catalog is told
    /// to pull documents from.
    pub fn new(host_url: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            host_url: normalize_base_url(host_url),
            client: build_client(&config)?,
            token: config.token,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.host_url, route)
    }

    /// URIs the location service currently serves.
    pub async fn discover(&self) -> Result<Vec<String>> {
        let response = send(
            SERVICE,
            self.client.get(self.url(Routes::LIST)),
            self.token.as_deref(),
        )
        .await?;
        let response = ensure_success(SERVICE, response).await?;
        let discovery: DiscoveryResponse = read_json(SERVICE, response).await?;
        Ok(discovery.uris)
    }

    /// Ask the location service to reload itself from storage.
    pub async fn trigger_rehydrate(&self) -> Result<()> {
        let response = send(
            SERVICE,
            self.client.get(self.url(Routes::BACKGROUND_POLL)),
            self.token.as_deref(),
        )
        .await?;
        ensure_success(SERVICE, response).await.map(|_| ())
    }
}

#[async_trait]
impl LocationService for LocationServiceClient {
    fn host_url(&self) -> &str {
        &self.host_url
    }

    async fn upsert_model(&self, key: &str, body: &[u8]) -> Result<UpsertOutcome> {
        debug!("Pushing {} bytes for key {} to location service", body.len(), key);
        let request = self
            .client
            .post(self.url(Routes::UPSERT))
            .query(&[("key", key)])
            .json(&PostBody {
                body: body.to_vec(),
            });
        let response = send(SERVICE, request, self.token.as_deref()).await?;
        let response = ensure_success(SERVICE, response).await?;
        Ok(match response.status() {
            StatusCode::CREATED => UpsertOutcome::Created,
            _ => UpsertOutcome::Updated,
        })
    }

    async fn remove_model(&self, key: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.url(Routes::REMOVE))
            .query(&[("key", key)]);
        let response = send(SERVICE, request, self.token.as_deref()).await?;
        ensure_success(SERVICE, response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn router() -> Router {
        Router::new()
            .route(
                "/upsert",
                post(
                    |Query(q): Query<HashMap<String, String>>, Json(body): Json<PostBody>| async move {
                        match q.get("key").map(String::as_str) {
                            Some("ns_new") if body.body == b"X" => AxumStatus::CREATED,
                            Some("ns_old") => AxumStatus::OK,
                            _ => AxumStatus::SERVICE_UNAVAILABLE,
                        }
                    },
                ),
            )
            .route(
                "/remove",
                delete(|Query(q): Query<HashMap<String, String>>| async move {
                    if q.contains_key("key") {
                        AxumStatus::OK
                    } else {
                        AxumStatus::BAD_REQUEST
                    }
                }),
            )
            .route(
                "/list",
                get(|| async { Json(json!({"uris": ["/ns/a/catalog-info.yaml"]})) }),
            )
            .route("/poll", get(|| async { AxumStatus::OK }))
    }

    async fn client() -> LocationServiceClient {
        let base = serve(router()).await;
        LocationServiceClient::new(&base, ClientConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_maps_status_to_outcome() {
        let client = client().await;
        assert_eq!(
            client.upsert_model("ns_new", b"X").await.unwrap(),
            UpsertOutcome::Created
        );
        assert_eq!(
            client.upsert_model("ns_old", b"Y").await.unwrap(),
            UpsertOutcome::Updated
        );
    }

    #[tokio::test]
    async fn test_upsert_non_success_keeps_status() {
        let client = client().await;
        let err = client.upsert_model("ns_other", b"X").await.unwrap_err();
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_remove_discover_and_poll() {
        let client = client().await;
        client.remove_model("ns_a").await.unwrap();
        assert_eq!(client.discover().await.unwrap(), vec!["/ns/a/catalog-info.yaml"]);
        client.trigger_rehydrate().await.unwrap();
    }

    #[test]
    fn test_host_url_is_normalized() {
        let client =
            LocationServiceClient::new("http://location:9090/", ClientConfig::default()).unwrap();
        assert_eq!(client.host_url(), "http://location:9090");
    }
}
