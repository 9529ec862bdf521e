//! Client for the Backstage catalog locations API.
//!
//! Only the three location endpoints the bridge needs are covered:
//! - `POST /api/catalog/locations` registers a URL location
//! - `GET /api/catalog/locations/{id}` looks one up
//! - `DELETE /api/catalog/locations/{id}` unregisters it

use crate::http::{build_client, ensure_success, normalize_base_url, read_json, send, ClientConfig};
use async_trait::async_trait;
use model_catalog_bridge::{Catalog, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const SERVICE: &str = "catalog";
const LOCATIONS_PATH: &str = "/api/catalog/locations";

#[derive(Debug, Serialize)]
struct LocationSpec<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    target: &'a str,
}

/// HTTP client for a Backstage catalog.
pub struct BackstageCatalogClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl BackstageCatalogClient {
    pub fn new(base_url: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url),
            client: build_client(&config)?,
            token: config.token,
        })
    }

    fn location_url(&self, id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            LOCATIONS_PATH,
            urlencoding::encode(id)
        )
    }
}

#[async_trait]
impl Catalog for BackstageCatalogClient {
    async fn import_location(&self, target_url: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, LOCATIONS_PATH);
        info!("Importing location {} into catalog", target_url);

        let request = self.client.post(&url).json(&LocationSpec {
            kind: "url",
            target: target_url,
        });
        let response = send(SERVICE, request, self.token.as_deref()).await?;
        let response = ensure_success(SERVICE, response).await?;
        read_json(SERVICE, response).await
    }

    async fn get_location(&self, id: &str) -> Result<Option<Value>> {
        let url = self.location_url(id);
        debug!("Probing catalog location {}", url);

        let response = send(SERVICE, self.client.get(&url), self.token.as_deref()).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(SERVICE, response).await?;
        read_json(SERVICE, response).await.map(Some)
    }

    async fn delete_location(&self, id: &str) -> Result<String> {
        let url = self.location_url(id);
        info!("Deleting catalog location {}", id);

        let response = send(SERVICE, self.client.delete(&url), self.token.as_deref()).await?;
        let response = ensure_success(SERVICE, response).await?;
        Ok(response.text().await.unwrap_or_default())
    }
}
