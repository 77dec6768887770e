//! File system based queue store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::QueueStore;

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;

const ENTRY_EXTENSION: &str = "bin";
const NEXT_KEY_FILE: &str = ".next_key";

/// File system based queue store.
///
/// Each payload is stored as its own file, named by its zero-padded key:
/// ```text
/// {storage_path}/
/// └── queue/
///     ├── .next_key
///     ├── 00000000000000000001.bin
///     └── 00000000000000000002.bin
/// ```
/// Entries are written to a temporary file and renamed into place.
pub struct FileQueueStore {
    /// Base storage path.
    storage_path: PathBuf,
    /// Next key to hand out; the lock also serializes every operation.
    next_key: Mutex<i64>,
}

impl FileQueueStore {
    /// Create a new file-based queue store.
    ///
    /// # Arguments
    /// * `storage_path` - Base directory for storing queue files
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        let queue_dir = storage_path.join("queue");
        fs::create_dir_all(&queue_dir).await?;

        remove_stale_temp_files(&queue_dir).await?;

        let highest = scan_entries(&queue_dir)
            .await?
            .last()
            .map(|(key, _)| *key)
            .unwrap_or(0);
        let persisted = read_next_key(&queue_dir.join(NEXT_KEY_FILE)).await?;
        let next_key = persisted.max(highest + 1).max(1);

        debug!("FileQueueStore initialized at {:?} (next key {})", storage_path, next_key);

        Ok(Self {
            storage_path,
            next_key: Mutex::new(next_key),
        })
    }

    /// Get the queue directory path.
    fn queue_dir(&self) -> PathBuf {
        self.storage_path.join("queue")
    }

    /// Get the file path for an entry.
    fn entry_path(&self, key: i64) -> PathBuf {
        self.queue_dir().join(format!("{:020}.{}", key, ENTRY_EXTENSION))
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    fn id(&self) -> &str {
        "file"
    }

    async fn append(&self, payload: Bytes) -> Result<i64, StoreError> {
        let mut next_key = self.next_key.lock().await;
        let key = *next_key;

        // The counter is persisted first so a crash can only leave a gap, never a reused key.
        write_atomic(
            &self.queue_dir().join(NEXT_KEY_FILE),
            (key + 1).to_string().as_bytes(),
        )
        .await?;
        write_atomic(&self.entry_path(key), &payload).await?;
        *next_key = key + 1;

        debug!("Appended entry {} to file store", key);
        Ok(key)
    }

    async fn list_all(&self) -> Result<Vec<Bytes>, StoreError> {
        let _guard = self.next_key.lock().await;

        let mut payloads = Vec::new();
        for (key, path) in scan_entries(&self.queue_dir()).await? {
            let content = fs::read(&path).await.map_err(|e| {
                StoreError::Corrupted(format!("Failed to read entry {}: {}", key, e))
            })?;
            payloads.push(Bytes::from(content));
        }

        Ok(payloads)
    }

    async fn remove_oldest(&self) -> Result<(), StoreError> {
        let _guard = self.next_key.lock().await;

        if let Some((key, path)) = scan_entries(&self.queue_dir()).await?.into_iter().next() {
            fs::remove_file(&path).await?;
            debug!("Removed entry {} from file store", key);
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let _guard = self.next_key.lock().await;
        Ok(scan_entries(&self.queue_dir()).await?.len())
    }
}

/// List entry files sorted by key.
async fn scan_entries(dir: &Path) -> Result<Vec<(i64, PathBuf)>, StoreError> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != ENTRY_EXTENSION) {
            continue;
        }

        match path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<i64>().ok())
        {
            Some(key) => entries.push((key, path)),
            None => warn!("Skipping unrecognized queue file {:?}", path),
        }
    }

    entries.sort_by_key(|(key, _)| *key);
    Ok(entries)
}

async fn read_next_key(path: &Path) -> Result<i64, StoreError> {
    match fs::read_to_string(path).await {
        Ok(content) => content.trim().parse::<i64>().map_err(|e| {
            StoreError::Corrupted(format!("Invalid key counter in {:?}: {}", path, e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(1),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn remove_stale_temp_files(dir: &Path) -> Result<(), StoreError> {
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            debug!("Removing stale temp file {:?}", path);
            fs::remove_file(&path).await?;
        }
    }
    Ok(())
}
