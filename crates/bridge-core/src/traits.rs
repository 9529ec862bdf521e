//! Capability contracts for the three collaborators of the bridge.
//!
//! The sync core never talks to a concrete backend or HTTP client; it is
//! handed trait objects for the storage tier, the location service and the
//! catalog at construction time.

use crate::error::Result;
use crate::types::StorageBody;
use async_trait::async_trait;
use serde_json::Value;

/// Read side of the storage tier.
///
/// This is all the location registry needs for rehydration, and all the
/// storage service exposes over HTTP.
#[async_trait]
pub trait StorageReader: Send + Sync {
    /// List every key currently held.
    async fn list(&self) -> Result<Vec<String>>;

    /// Fetch the record for a key.
    ///
    /// Returns `None` if the key is not held.
    async fn fetch(&self, key: &str) -> Result<Option<StorageBody>>;
}

/// Full storage tier: arbitrary key/value store of [`StorageBody`] records.
#[async_trait]
pub trait Storage: StorageReader {
    /// Create or overwrite the record for a key.
    async fn upsert(&self, key: &str, body: &StorageBody) -> Result<()>;

    /// Remove the record for a key. Removing an unknown key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Result of pushing content to the location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new location slot was registered.
    Created,
    /// An existing slot had its content replaced.
    Updated,
}

/// The location service as seen by the sync core.
#[async_trait]
pub trait LocationService: Send + Sync {
    /// Base URL the catalog reaches the location service under.
    fn host_url(&self) -> &str;

    /// Publish content for a key.
    async fn upsert_model(&self, key: &str, body: &[u8]) -> Result<UpsertOutcome>;

    /// Soft-delete the content published for a key.
    async fn remove_model(&self, key: &str) -> Result<()>;
}

/// The external developer catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Register a location URL, returning the raw import response.
    async fn import_location(&self, target_url: &str) -> Result<Value>;

    /// Look up a previously imported location.
    ///
    /// Returns `None` if the catalog no longer knows the identifier.
    async fn get_location(&self, id: &str) -> Result<Option<Value>>;

    /// Delete a previously imported location, returning the catalog's message.
    async fn delete_location(&self, id: &str) -> Result<String>;
}
