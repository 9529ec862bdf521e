//! Collaborator fakes shared by the unit tests.

use crate::error::{BridgeError, Result};
use crate::location::LocationRegistry;
use crate::storage::MemoryStorage;
use crate::traits::{Catalog, LocationService, Storage, StorageReader, UpsertOutcome};
use crate::types::StorageBody;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct CatalogState {
    locations: HashMap<String, String>,
    next_id: u32,
    import_calls: u32,
    get_calls: u32,
    delete_calls: u32,
    fail_get: bool,
    fail_import: bool,
    fail_delete: bool,
    malformed_import: bool,
}

/// Catalog double recording every call.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    state: Mutex<CatalogState>,
}

impl FakeCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_location(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .locations
            .insert(id.to_string(), format!("http://location/{}", id));
    }

    pub(crate) fn forget_location(&self, id: &str) {
        self.state.lock().unwrap().locations.remove(id);
    }

    pub(crate) fn has_location(&self, id: &str) -> bool {
        self.state.lock().unwrap().locations.contains_key(id)
    }

    pub(crate) fn fail_get(&self, fail: bool) {
        self.state.lock().unwrap().fail_get = fail;
    }

    pub(crate) fn fail_import(&self, fail: bool) {
        self.state.lock().unwrap().fail_import = fail;
    }

    pub(crate) fn fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub(crate) fn malformed_import(&self, malformed: bool) {
        self.state.lock().unwrap().malformed_import = malformed;
    }

    pub(crate) fn import_calls(&self) -> u32 {
        self.state.lock().unwrap().import_calls
    }

    pub(crate) fn get_calls(&self) -> u32 {
        self.state.lock().unwrap().get_calls
    }

    pub(crate) fn delete_calls(&self) -> u32 {
        self.state.lock().unwrap().delete_calls
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn import_location(&self, target_url: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.import_calls += 1;
        if state.fail_import {
            return Err(BridgeError::network("catalog unreachable"));
        }
        if state.malformed_import {
            return Ok(json!({"entities": []}));
        }
        state.next_id += 1;
        let id = format!("loc-{}", state.next_id);
        state.locations.insert(id.clone(), target_url.to_string());
        Ok(json!({
            "location": {"id": id, "type": "url", "target": target_url},
            "entities": []
        }))
    }

    async fn get_location(&self, id: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if state.fail_get {
            return Err(BridgeError::network("catalog unreachable"));
        }
        Ok(state
            .locations
            .get(id)
            .map(|target| json!({"id": id, "type": "url", "target": target})))
    }

    async fn delete_location(&self, id: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        if state.fail_delete {
            return Err(BridgeError::network("catalog unreachable"));
        }
        state.locations.remove(id);
        Ok(String::new())
    }
}

/// Location service double delegating to a real registry.
pub(crate) struct FakeLocations {
    pub(crate) registry: LocationRegistry,
    upsert_calls: AtomicU32,
    fail_upsert: Mutex<bool>,
    fail_remove_for: Mutex<HashSet<String>>,
}

impl FakeLocations {
    pub(crate) fn new(registry: LocationRegistry) -> Self {
        Self {
            registry,
            upsert_calls: AtomicU32::new(0),
            fail_upsert: Mutex::new(false),
            fail_remove_for: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn upsert_calls(&self) -> u32 {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_upsert(&self, fail: bool) {
        *self.fail_upsert.lock().unwrap() = fail;
    }

    pub(crate) fn fail_remove_for(&self, key: &str) {
        self.fail_remove_for.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl LocationService for FakeLocations {
    fn host_url(&self) -> &str {
        self.registry.host_url()
    }

    async fn upsert_model(&self, key: &str, body: &[u8]) -> Result<UpsertOutcome> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let fail = *self.fail_upsert.lock().unwrap();
        if fail {
            return Err(BridgeError::network("location service unreachable"));
        }
        self.registry.upsert_model(key, body).await
    }

    async fn remove_model(&self, key: &str) -> Result<()> {
        let fail = self.fail_remove_for.lock().unwrap().contains(key);
        if fail {
            return Err(BridgeError::network("location service unreachable"));
        }
        self.registry.remove_model(key).await
    }
}

/// Storage wrapper injecting failures in front of a real backend.
pub(crate) struct FlakyStorage {
    inner: MemoryStorage,
    list_failures: AtomicU32,
    fail_upsert_after: Mutex<Option<u32>>,
    upsert_calls: AtomicU32,
    fail_remove_for: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub(crate) fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            list_failures: AtomicU32::new(0),
            fail_upsert_after: Mutex::new(None),
            upsert_calls: AtomicU32::new(0),
            fail_remove_for: Mutex::new(HashSet::new()),
        }
    }

    /// Fail the next `times` list calls.
    pub(crate) fn fail_list_times(&self, times: u32) {
        self.list_failures.store(times, Ordering::SeqCst);
    }

    /// Let `successes` upserts through, then fail every following one.
    pub(crate) fn fail_upsert_after(&self, successes: u32) {
        self.upsert_calls.store(0, Ordering::SeqCst);
        *self.fail_upsert_after.lock().unwrap() = Some(successes);
    }

    pub(crate) fn fail_remove_for(&self, key: &str) {
        self.fail_remove_for.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl StorageReader for FlakyStorage {
    async fn list(&self) -> Result<Vec<String>> {
        let remaining = self.list_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.list_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(BridgeError::network("storage service unreachable"));
        }
        self.inner.list().await
    }

    async fn fetch(&self, key: &str) -> Result<Option<StorageBody>> {
        self.inner.fetch(key).await
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn upsert(&self, key: &str, body: &StorageBody) -> Result<()> {
        let calls = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let limit = *self.fail_upsert_after.lock().unwrap();
        if let Some(successes) = limit {
            if calls >= successes {
                return Err(BridgeError::storage("storage write failed"));
            }
        }
        self.inner.upsert(key, body).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let fail = self.fail_remove_for.lock().unwrap().contains(key);
        if fail {
            return Err(BridgeError::storage("storage remove failed"));
        }
        self.inner.remove(key).await
    }
}
