//! Queue store trait and in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info};

use snapqueue_config::{ConfigLoader, StoreBackend, StoreConfig};

use crate::error::StoreError;
use crate::file::FileQueueStore;
use crate::sqlite::SqliteQueueStore;

/// Durable FIFO storage for pending payloads.
///
/// Every entry gets a store-assigned key greater than any key issued before,
/// so ascending key order is capture order. Only the oldest entry can be removed.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Backend identifier, used in logs.
    fn id(&self) -> &str;

    /// Persist a payload and return its key.
    async fn append(&self, payload: Bytes) -> Result<i64, StoreError>;

    /// All pending payloads in ascending key order.
    async fn list_all(&self) -> Result<Vec<Bytes>, StoreError>;

    /// Remove the entry with the smallest key. No-op on an empty store.
    async fn remove_oldest(&self) -> Result<(), StoreError>;

    /// Number of pending payloads.
    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.list_all().await?.len())
    }
}

struct MemoryState {
    next_key: i64,
    entries: BTreeMap<i64, Bytes>,
}

/// In-memory queue store for tests and ephemeral runs.
pub struct MemoryQueueStore {
    state: RwLock<MemoryState>,
}

impl MemoryQueueStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_key: 1,
                entries: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn append(&self, payload: Bytes) -> Result<i64, StoreError> {
        let mut state = self.state.write().await;
        let key = state.next_key;
        state.next_key += 1;
        state.entries.insert(key, payload);
        Ok(key)
    }

    async fn list_all(&self) -> Result<Vec<Bytes>, StoreError> {
        let state = self.state.read().await;
        Ok(state.entries.values().cloned().collect())
    }

    async fn remove_oldest(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some((key, _)) = state.entries.pop_first() {
            debug!("Removed entry {} from memory store", key);
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().await.entries.len())
    }
}

/// Open the store backend selected in configuration.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn QueueStore>, StoreError> {
    let path = ConfigLoader::expand_pathbuf(&config.path);

    let store: Arc<dyn QueueStore> = match config.backend {
        StoreBackend::Sqlite => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            Arc::new(SqliteQueueStore::open(&path).await?)
        }
        StoreBackend::File => Arc::new(FileQueueStore::new(&path).await?),
        StoreBackend::Memory => Arc::new(MemoryQueueStore::new()),
    };

    info!("Opened '{}' queue store at {}", store.id(), path.display());
    Ok(store)
}
