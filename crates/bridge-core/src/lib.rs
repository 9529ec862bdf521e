//! Model Catalog Bridge - keeps a developer catalog in sync with a model registry.
//!
//! Normalized model documents arrive keyed by `<namespace>_<name>`. The bridge
//! persists them in a storage tier, publishes them through a location service
//! under stable URIs, and imports each URI into the catalog exactly once. A
//! reconciliation pass removes everything that left the upstream key set.
//!
//! This crate holds the HTTP-free core. Clients for the remote services live
//! in `model-catalog-bridge-clients`; the servers in
//! `model-catalog-bridge-server`.
//!
//! # Example
//!
//! ```rust,ignore
//! use model_catalog_bridge::{Bridge, LocationRegistry, MemoryStorage, NormalizerFormat};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let locations = Arc::new(LocationRegistry::new(
//!     NormalizerFormat::CatalogInfoYaml,
//!     "http://location:9090",
//! ));
//! let bridge = Bridge::new(storage, locations, catalog, NormalizerFormat::CatalogInfoYaml);
//!
//! bridge.upsert("ns_model1", yaml.into_bytes()).await?;
//! bridge.reconcile(["ns_model1"]).await?;
//! ```

pub mod cancel;
pub mod codec;
pub mod config;
pub mod error;
pub mod location;
pub mod storage;
pub mod sync;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use cancel::CancellationToken;
pub use codec::{build_import_key_and_uri, ModelKey};
pub use config::{BridgeDefaults, NormalizerFormat, StorageType};
pub use error::{BridgeError, Result};
pub use location::{LocationRegistry, RehydrateConfig, RehydrateOutcome, Rehydrator};
pub use storage::{open_storage, MemoryStorage, SqliteStorage};
pub use sync::{Bridge, CacheConfig, ReconcileReport, SyncCache, SyncOutcome};
pub use traits::{Catalog, LocationService, Storage, StorageReader, UpsertOutcome};
pub use types::{ImportedLocation, StorageBody};
