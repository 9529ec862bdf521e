//! URI-keyed document slots served by the location service.
//!
//! The HTTP route table of the location service is append-only: once a URI
//! has been registered it keeps resolving for the lifetime of the process.
//! Deleting a document therefore clears the slot's content instead of
//! dropping the slot, and discovery only reports slots that hold content.

use crate::codec::ModelKey;
use crate::config::NormalizerFormat;
use crate::error::Result;
use crate::traits::{LocationService, UpsertOutcome};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// One registered URI and its current document, if any.
#[derive(Debug, Default)]
pub struct LocationSlot {
    content: RwLock<Option<Bytes>>,
}

impl LocationSlot {
    /// Current content; `None` if soft-deleted or never populated.
    pub fn content(&self) -> Option<Bytes> {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, content: Option<Bytes>) {
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = content;
    }

    fn is_populated(&self) -> bool {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// In-memory registry of catalog documents keyed by location URI.
///
/// Slot registration goes through a concurrent map; content replacement only
/// locks the slot being written, so readers of other URIs never wait and a
/// reader of the same URI sees either the old or the new payload.
pub struct LocationRegistry {
    routes: DashMap<String, Arc<LocationSlot>>,
    format: NormalizerFormat,
    host_url: String,
}

impl LocationRegistry {
    /// Create an empty registry.
    ///
    /// `host_url` is the externally reachable base URL of the location
    /// service; it prefixes every URI handed to the catalog.
    pub fn new(format: NormalizerFormat, host_url: impl Into<String>) -> Self {
        Self {
            routes: DashMap::new(),
            format,
            host_url: host_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn format(&self) -> NormalizerFormat {
        self.format
    }

    /// Content served under `uri`.
    pub fn get(&self, uri: &str) -> Option<Bytes> {
        self.routes.get(uri).and_then(|slot| slot.content())
    }

    /// Whether a slot was ever registered for `uri`.
    pub fn is_registered(&self, uri: &str) -> bool {
        self.routes.contains_key(uri)
    }

    /// Publish content under `uri`, registering the slot on first use.
    pub fn upsert(&self, uri: &str, content: Bytes) -> UpsertOutcome {
        let mut created = false;
        let slot = self
            .routes
            .entry(uri.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(LocationSlot::default())
            })
            .value()
            .clone();

        debug!("Upserting URI {} with data of len {}", uri, content.len());
        slot.set(Some(content));

        if created {
            info!("Registered location {}", uri);
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        }
    }

    /// Soft-delete the content under `uri`. The slot itself stays registered.
    ///
    /// Returns whether a slot existed.
    pub fn delete(&self, uri: &str) -> bool {
        match self.routes.get(uri) {
            Some(slot) => {
                info!("Removing URI {}", uri);
                slot.set(None);
                true
            }
            None => false,
        }
    }

    /// URIs currently holding content, in no particular order.
    pub fn discover(&self) -> Vec<String> {
        self.routes
            .iter()
            .filter(|entry| entry.value().is_populated())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of registered slots, populated or not.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// URI for a storage key under this registry's format.
    pub fn uri_for_key(&self, key: &str) -> Result<String> {
        Ok(ModelKey::parse(key)?.uri(self.format))
    }

    /// Publish content for a storage key.
    pub fn upsert_key(&self, key: &str, content: Bytes) -> Result<UpsertOutcome> {
        let uri = self.uri_for_key(key)?;
        Ok(self.upsert(&uri, content))
    }

    /// Soft-delete the content for a storage key.
    pub fn delete_key(&self, key: &str) -> Result<()> {
        let uri = self.uri_for_key(key)?;
        self.delete(&uri);
        Ok(())
    }
}

#[async_trait]
impl LocationService for LocationRegistry {
    fn host_url(&self) -> &str {
        &self.host_url
    }

    async fn upsert_model(&self, key: &str, body: &[u8]) -> Result<UpsertOutcome> {
        self.upsert_key(key, Bytes::copy_from_slice(body))
    }

    async fn remove_model(&self, key: &str) -> Result<()> {
        self.delete_key(key)
    }
}
