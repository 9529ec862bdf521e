//! The synchronization core.
//!
//! [`Bridge`] keeps the storage tier, the location service and the catalog
//! consistent. It owns no durable state of its own: every decision is made
//! from storage, with the [`SyncCache`] only saving catalog round trips.

use super::cache::{CacheConfig, SyncCache};
use crate::codec::ModelKey;
use crate::config::NormalizerFormat;
use crate::error::{BridgeError, Result};
use crate::traits::{Catalog, LocationService, Storage, StorageReader};
use crate::types::{ImportedLocation, StorageBody};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// First successful push: the location was imported into the catalog.
    Imported { location_id: String },
    /// The key was already imported; only content changed.
    Updated,
}

/// Summary of a reconciliation pass that completed without errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Keys removed from storage, cache, catalog and location service.
    pub removed: Vec<String>,
    /// Keys that are still part of the current key set.
    pub retained: usize,
}

/// Orchestrates upserts and removals across the three collaborators.
pub struct Bridge {
    storage: Arc<dyn Storage>,
    locations: Arc<dyn LocationService>,
    catalog: Arc<dyn Catalog>,
    cache: SyncCache,
    format: NormalizerFormat,
}

impl Bridge {
    pub fn new(
        storage: Arc<dyn Storage>,
        locations: Arc<dyn LocationService>,
        catalog: Arc<dyn Catalog>,
        format: NormalizerFormat,
    ) -> Self {
        Self {
            storage,
            locations,
            catalog,
            cache: SyncCache::default(),
            format,
        }
    }

    /// Replace the sync cache configuration.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = SyncCache::new(config);
        self
    }

    pub fn cache(&self) -> &SyncCache {
        &self.cache
    }

    pub fn format(&self) -> NormalizerFormat {
        self.format
    }

    /// Store new content for a key, publish it, and import it into the
    /// catalog if that has not happened yet.
    ///
    /// The storage write and the location push are not rolled back when a
    /// later step fails; the next upsert or a rehydration repairs them. If the
    /// catalog import succeeds but its identifier cannot be stored, the
    /// import is repeated by the next upsert.
    pub async fn upsert(&self, key: &str, content: Vec<u8>) -> Result<SyncOutcome> {
        let model_key = ModelKey::parse(key)?;
        let key = model_key.storage_key();
        let uri = model_key.uri(self.format);
        info!(
            "Upserting URI {} with key {} with data of len {}",
            uri,
            key,
            content.len()
        );

        let mut guard = self.cache.lock(&key).await;
        let mut sb = guard
            .sync(self.storage.as_ref(), self.catalog.as_ref())
            .await
            .inspect_err(|e| error!("error syncing key {}: {}", key, e))?;

        let already_imported = sb.is_imported();
        sb.body = content;
        self.storage.upsert(&key, &sb).await.map_err(|e| {
            error!("error upserting to storage key {}: {}", key, e);
            e
        })?;
        guard.remember(&sb);

        self.locations
            .upsert_model(&key, &sb.body)
            .await
            .map_err(|e| {
                error!("error upserting to location uri {}: {}", uri, e);
                e
            })?;

        if already_imported {
            info!(
                "{} already provides location {}",
                self.locations.host_url(),
                uri
            );
            return Ok(SyncOutcome::Updated);
        }

        let target_url = format!("{}{}", self.locations.host_url(), uri);
        let response = self.catalog.import_location(&target_url).await.map_err(|e| {
            error!("error importing location {} to catalog: {}", target_url, e);
            e
        })?;
        let Some(imported) = ImportedLocation::from_response(&response) else {
            error!(
                "parsing of import location return had an issue: {}",
                response
            );
            return Err(BridgeError::CatalogResponse {
                message: response.to_string(),
            });
        };

        sb.location_id = imported.id;
        sb.location_target = imported.target;
        self.storage.upsert(&key, &sb).await.map_err(|e| {
            error!(
                "error upserting to storage key {} with catalog location {}: {}",
                key, sb.location_id, e
            );
            e
        })?;

        info!(
            "Imported location {} for target {}",
            sb.location_id, sb.location_target
        );
        Ok(SyncOutcome::Imported {
            location_id: sb.location_id,
        })
    }

    /// Remove every stored key missing from `current_keys`.
    ///
    /// Current keys are matched in their parsed form, so `ns_model1_v2`
    /// keeps `ns_model1`.
    ///
    /// Each key is removed from storage, the cache, the catalog (when it was
    /// imported) and the location service. A failing key does not stop the
    /// others; all failures are reported together once every key was
    /// attempted, and successful removals stay in place.
    pub async fn reconcile<I, S>(&self, current_keys: I) -> Result<ReconcileReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Upsert stores keys in their parsed form, so compare in that form too.
        let current: HashSet<String> = current_keys
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| ModelKey::parse(&k).map(|mk| mk.storage_key()).unwrap_or(k))
            .collect();

        let stored = self.storage.list().await.map_err(|e| {
            error!("error listing location keys: {}", e);
            e
        })?;

        let mut report = ReconcileReport::default();
        let mut failures = Vec::new();
        for key in stored {
            if current.contains(&key) {
                report.retained += 1;
                continue;
            }
            match self.remove_key(&key).await {
                Ok(()) => report.removed.push(key),
                Err(e) => failures.push(format!("{}: {}", key, e)),
            }
        }

        if !failures.is_empty() {
            warn!(
                "Reconciliation removed {} keys, {} failed",
                report.removed.len(),
                failures.len()
            );
            return Err(BridgeError::Reconcile { failures });
        }
        info!(
            "Reconciliation removed {} keys, retained {}",
            report.removed.len(),
            report.retained
        );
        Ok(report)
    }

    async fn remove_key(&self, key: &str) -> Result<()> {
        let mut guard = self.cache.lock(key).await;

        let last = match self.storage.fetch(key).await {
            Ok(body) => body.unwrap_or_default(),
            Err(e) => {
                error!("error fetching storage key {} before removal: {}", key, e);
                StorageBody::default()
            }
        };

        self.storage.remove(key).await.map_err(|e| {
            error!("error removing from storage key {}: {}", key, e);
            e
        })?;
        guard.invalidate();

        if last.is_imported() {
            match self.catalog.delete_location(&last.location_id).await {
                Ok(_) => info!(
                    "deletion of location {} for target {} successful",
                    last.location_id, last.location_target
                ),
                Err(e) => error!(
                    "deletion of location {} for target {} had error: {}",
                    last.location_id, last.location_target, e
                ),
            }
        }

        self.locations.remove_model(key).await.map_err(|e| {
            error!("error removing key {} from location service: {}", key, e);
            e
        })
    }

    /// Read-through fetch from storage. Unknown keys yield an empty record.
    pub async fn fetch(&self, key: &str) -> Result<StorageBody> {
        Ok(self.storage.fetch(key).await?.unwrap_or_default())
    }

    /// Read-through listing of storage keys.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.storage.list().await
    }
}
