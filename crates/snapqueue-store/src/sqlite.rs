//! SQLite queue store implementation.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::error::StoreError;
use crate::schema::init_schema;
use crate::store::QueueStore;

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;

/// SQLite-backed queue store.
///
/// Each statement runs on the connection's own thread, so `append`,
/// `list_all` and `remove_oldest` are individually atomic.
pub struct SqliteQueueStore {
    conn: Connection,
}

impl SqliteQueueStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.call(|conn| Ok(init_schema(conn)?)).await?;

        Ok(Self { conn })
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;

        conn.call(|conn| Ok(init_schema(conn)?)).await?;

        debug!("SqliteQueueStore opened at {:?}", path);
        Ok(Self { conn })
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, payload: Bytes) -> Result<i64, StoreError> {
        let payload = payload.to_vec();
        let created_at = Utc::now().to_rfc3339();

        let key = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO upload_queue (payload, created_at) VALUES (?1, ?2)",
                    params![payload, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!("Appended entry {} to sqlite store", key);
        Ok(key)
    }

    async fn list_all(&self) -> Result<Vec<Bytes>, StoreError> {
        let payloads = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT payload FROM upload_queue ORDER BY key ASC")?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(payloads.into_iter().map(Bytes::from).collect())
    }

    async fn remove_oldest(&self) -> Result<(), StoreError> {
        let removed = self
            .conn
            .call(|conn| {
                let removed = conn.execute(
                    "DELETE FROM upload_queue WHERE key = (SELECT MIN(key) FROM upload_queue)",
                    [],
                )?;
                Ok(removed)
            })
            .await?;

        if removed > 0 {
            debug!("Removed oldest entry from sqlite store");
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM upload_queue", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;

        Ok(count as usize)
    }
}
