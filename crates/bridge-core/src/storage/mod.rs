//! Storage tier backends.
//!
//! Both backends implement [`crate::Storage`]. The in-memory backend is the
//! default; the SQLite backend survives restarts of the storage service.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::config::StorageType;
use crate::error::Result;
use crate::traits::Storage;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Open the storage backend selected by `storage_type`.
///
/// `sqlite_path` is only consulted for [`StorageType::Sqlite`].
pub fn open_storage(storage_type: StorageType, sqlite_path: &Path) -> Result<Arc<dyn Storage>> {
    info!("Opening {} storage backend", storage_type);
    match storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageType::Sqlite => Ok(Arc::new(SqliteStorage::open(sqlite_path)?)),
    }
}
