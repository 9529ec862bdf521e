//! In-memory storage backend.

use crate::error::{BridgeError, Result};
use crate::traits::{Storage, StorageReader};
use crate::types::StorageBody;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local storage backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, StorageBody>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> BridgeError {
        BridgeError::storage("memory storage lock poisoned")
    }
}

#[async_trait]
impl StorageReader for MemoryStorage {
    async fn list(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn fetch(&self, key: &str) -> Result<Option<StorageBody>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upsert(&self, key: &str, body: &StorageBody) -> Result<()> {
        let mut record = body.clone();
        record.location_id_valid = false;
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), record);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_fetch_remove() {
        let storage = MemoryStorage::new();
        let body = StorageBody {
            body: b"doc".to_vec(),
            location_id: "id-1".into(),
            location_target: "target".into(),
            location_id_valid: true,
        };

        storage.upsert("ns_m", &body).await.unwrap();
        let fetched = storage.fetch("ns_m").await.unwrap().unwrap();
        assert_eq!(fetched.body, b"doc");
        assert_eq!(fetched.location_id, "id-1");
        // Validity is a cache hint, not stored state.
        assert!(!fetched.location_id_valid);

        storage.remove("ns_m").await.unwrap();
        assert!(storage.fetch("ns_m").await.unwrap().is_none());
        // Removing twice is fine.
        storage.remove("ns_m").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let storage = MemoryStorage::new();
        for key in ["ns_c", "ns_a", "ns_b"] {
            storage.upsert(key, &StorageBody::default()).await.unwrap();
        }
        assert_eq!(storage.list().await.unwrap(), vec!["ns_a", "ns_b", "ns_c"]);
    }
}
