//! Read-only client for the storage service, used by location rehydration.

use crate::http::{build_client, ensure_success, normalize_base_url, read_json, send, ClientConfig};
use async_trait::async_trait;
use model_catalog_bridge::config::Routes;
use model_catalog_bridge::types::ListKeysResponse;
use model_catalog_bridge::{Result, StorageBody, StorageReader};
use reqwest::Client;
use tracing::debug;

const SERVICE: &str = "storage service";

/// HTTP client for the storage service's read endpoints.
pub struct StorageServiceClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl StorageServiceClient {
    pub fn new(base_url: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url),
            client: build_client(&config)?,
            token: config.token,
        })
    }
}

#[async_trait]
impl StorageReader for StorageServiceClient {
    async fn list(&self) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, Routes::LIST);
        debug!("Listing storage keys from {}", url);

        let response = send(SERVICE, self.client.get(&url), self.token.as_deref()).await?;
        let response = ensure_success(SERVICE, response).await?;
        let list: ListKeysResponse = read_json(SERVICE, response).await?;
        Ok(list.keys)
    }

    /// The storage service answers unknown keys with an empty record, which
    /// is reported here as `None`.
    async fn fetch(&self, key: &str) -> Result<Option<StorageBody>> {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, Routes::FETCH))
            .query(&[("key", key)]);
        let response = send(SERVICE, request, self.token.as_deref()).await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: StorageBody = read_json(SERVICE, response).await?;
        if body == StorageBody::default() {
            return Ok(None);
        }
        Ok(Some(body))
    }
}
