//! SQLite-based storage backend.

use crate::error::{BridgeError, Result};
use crate::traits::{Storage, StorageReader};
use crate::types::StorageBody;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// SQLite-backed storage tier.
///
/// Thread-safe via internal mutex on the connection. The validity hint of
/// [`StorageBody`] is never written.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the database at the specified path.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BridgeError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| BridgeError::Database {
            message: format!("Failed to open storage database: {}", e),
            source: Some(e),
        })?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| BridgeError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| BridgeError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage_bodies (
                key TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                location_id TEXT NOT NULL DEFAULT '',
                location_target TEXT NOT NULL DEFAULT '',
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );
            "#,
        )
        .map_err(|e| BridgeError::Database {
            message: format!("Failed to initialize storage schema: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }
}

#[async_trait]
impl StorageReader for SqliteStorage {
    async fn list(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM storage_bodies ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    async fn fetch(&self, key: &str) -> Result<Option<StorageBody>> {
        let conn = self.lock()?;
        let body = conn
            .query_row(
                "SELECT body, location_id, location_target FROM storage_bodies WHERE key = ?1",
                params![key],
                |row| {
                    Ok(StorageBody {
                        body: row.get(0)?,
                        location_id: row.get(1)?,
                        location_target: row.get(2)?,
                        location_id_valid: false,
                    })
                },
            )
            .optional()?;
        Ok(body)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn upsert(&self, key: &str, body: &StorageBody) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO storage_bodies (key, body, location_id, location_target, updated_at)
            VALUES (?1, ?2, ?3, ?4, strftime('%s', 'now'))
            ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                location_id = excluded.location_id,
                location_target = excluded.location_target,
                updated_at = excluded.updated_at
            "#,
            params![key, body.body, body.location_id, body.location_target],
        )?;
        debug!("Stored {} ({} bytes)", key, body.body.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM storage_bodies WHERE key = ?1", params![key])?;
        debug!("Removed {} ({} rows)", key, removed);
        Ok(())
    }
}
