//! Per-key catalog-import state, guarded by sharded async locks.
//!
//! Every key hashes onto one of a fixed number of shards. Holding a
//! [`KeyGuard`] serializes all work for that key (and for the other keys of
//! the same shard) including the storage and catalog calls made on its
//! behalf, so two upserts can never both decide that a key still needs a
//! catalog import. The cache itself only saves validity probes; storage stays
//! the source of truth.

use crate::config::BridgeDefaults;
use crate::error::Result;
use crate::traits::{Catalog, Storage, StorageReader};
use crate::types::StorageBody;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the sync cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a successful validity probe is trusted before the catalog is
    /// asked again.
    pub validity_ttl: Duration,
    /// Number of lock shards.
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            validity_ttl: BridgeDefaults::VALIDITY_TTL,
            shards: BridgeDefaults::CACHE_SHARDS,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedBody {
    body: StorageBody,
    validated_at: Instant,
}

type Shard = HashMap<String, CachedBody>;

/// In-process cache of keys with a confirmed catalog import.
pub struct SyncCache {
    shards: Vec<Mutex<Shard>>,
    validity_ttl: Duration,
}

impl SyncCache {
    pub fn new(config: CacheConfig) -> Self {
        let shards = (0..config.shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self {
            shards,
            validity_ttl: config.validity_ttl,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Acquire exclusive access to a key's cache state.
    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let shard = self.shards[self.shard_index(key)].lock().await;
        KeyGuard {
            key: key.to_string(),
            shard,
            validity_ttl: self.validity_ttl,
        }
    }

    /// Evict a key.
    pub async fn invalidate(&self, key: &str) {
        self.lock(key).await.invalidate();
    }

    /// Whether a key currently has a validated entry.
    pub async fn contains(&self, key: &str) -> bool {
        self.lock(key).await.is_cached()
    }

    /// Number of cached entries across all shards.
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SyncCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Exclusive handle on one key's cache state.
pub struct KeyGuard<'a> {
    key: String,
    shard: MutexGuard<'a, Shard>,
    validity_ttl: Duration,
}

impl KeyGuard<'_> {
    pub fn is_cached(&self) -> bool {
        self.shard.contains_key(&self.key)
    }

    /// Return the key's record with a freshly confirmed catalog validity.
    ///
    /// A validated cache entry younger than the validity TTL is returned
    /// without any external call. Otherwise the record is fetched from
    /// storage and, if it was imported, the catalog is asked whether the
    /// location still exists. A location the catalog no longer knows, or
    /// cannot confirm, is a stale registration: the record is removed from
    /// storage and cache and an empty body comes back so the caller imports
    /// from scratch. Only storage errors are returned.
    pub async fn sync(&mut self, storage: &dyn Storage, catalog: &dyn Catalog) -> Result<StorageBody> {
        if let Some(cached) = self.shard.get(&self.key) {
            if cached.body.location_id_valid && cached.validated_at.elapsed() < self.validity_ttl {
                debug!("Cache hit for {}", self.key);
                return Ok(cached.body.clone());
            }
        }

        let mut body = storage.fetch(&self.key).await?.unwrap_or_default();
        if !body.is_imported() {
            self.shard.remove(&self.key);
            return Ok(body);
        }

        match catalog.get_location(&body.location_id).await {
            Ok(Some(_)) => {
                body.location_id_valid = true;
                self.shard.insert(
                    self.key.clone(),
                    CachedBody {
                        body: body.clone(),
                        validated_at: Instant::now(),
                    },
                );
                Ok(body)
            }
            Ok(None) => {
                info!(
                    "previously registered location {}:{} is no longer valid, unregistering",
                    body.location_id, body.location_target
                );
                self.unregister(storage).await
            }
            Err(e) => {
                warn!(
                    "previously registered location {}:{} could not be confirmed ({}), unregistering",
                    body.location_id, body.location_target, e
                );
                self.unregister(storage).await
            }
        }
    }

    async fn unregister(&mut self, storage: &dyn Storage) -> Result<StorageBody> {
        self.shard.remove(&self.key);
        storage.remove(&self.key).await?;
        Ok(StorageBody::default())
    }

    /// Refresh the cached record after its content changed.
    ///
    /// Only an existing validated entry is updated; its validation time is
    /// left alone.
    pub fn remember(&mut self, body: &StorageBody) {
        if let Some(cached) = self.shard.get_mut(&self.key) {
            cached.body = StorageBody {
                location_id_valid: true,
                ..body.clone()
            };
        }
    }

    /// Evict the key.
    pub fn invalidate(&mut self) {
        self.shard.remove(&self.key);
    }
}
