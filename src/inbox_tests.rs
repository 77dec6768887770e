use super::*;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use snapqueue_config::ProcessorConfig;
use snapqueue_processor::{
    NullProgressReporter, QueueProcessor, UploadError, UploadReceipt, Uploader,
};
use snapqueue_store::{MemoryQueueStore, QueueStore};
use tempfile::TempDir;

/// Never finishes, so every queued payload stays in the store.
struct StalledUploader;

#[async_trait]
impl Uploader for StalledUploader {
    async fn upload(&self, _payload: Bytes) -> Result<UploadReceipt, UploadError> {
        std::future::pending().await
    }
}

fn queue_with_store() -> (QueueHandle, Arc<MemoryQueueStore>) {
    let store = Arc::new(MemoryQueueStore::new());
    let (handle, _join) = QueueProcessor::new(
        store.clone(),
        Arc::new(StalledUploader),
        Arc::new(NullProgressReporter),
        &ProcessorConfig::default(),
    )
    .spawn();
    (handle, store)
}

fn watcher(dir: &Path, handle: QueueHandle, remove_after_enqueue: bool) -> InboxWatcher {
    let config = InboxConfig {
        path: dir.to_path_buf(),
        remove_after_enqueue,
        debounce_ms: 50,
        ..InboxConfig::default()
    };
    InboxWatcher::new(&config, dir.to_path_buf(), handle).unwrap()
}

#[tokio::test]
async fn test_matches_patterns_on_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let (handle, _store) = queue_with_store();
    let inbox = watcher(temp_dir.path(), handle, true);

    assert!(inbox.matches(Path::new("/inbox/IMG_0001.jpg")));
    assert!(inbox.matches(Path::new("/inbox/shot.webp")));
    assert!(!inbox.matches(Path::new("/inbox/notes.txt")));
    assert!(!inbox.matches(Path::new("/inbox/.partial.jpg")));
}

#[tokio::test]
async fn test_invalid_pattern_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let (handle, _store) = queue_with_store();
    let config = InboxConfig {
        patterns: vec!["[".to_string()],
        ..InboxConfig::default()
    };
    assert!(InboxWatcher::new(&config, temp_dir.path().to_path_buf(), handle).is_err());
}

#[tokio::test]
async fn test_scan_existing_queues_in_name_order() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("b.jpg"), "second").unwrap();
    std::fs::write(temp_dir.path().join("a.jpg"), "first").unwrap();
    std::fs::write(temp_dir.path().join("readme.txt"), "ignored").unwrap();

    let (handle, store) = queue_with_store();
    let inbox = watcher(temp_dir.path(), handle, true);

    assert_eq!(inbox.scan_existing().await.unwrap(), 2);
    assert_eq!(
        store.list_all().await.unwrap(),
        vec![Bytes::from("first"), Bytes::from("second")]
    );
    assert!(!temp_dir.path().join("a.jpg").exists());
    assert!(!temp_dir.path().join("b.jpg").exists());
    assert!(temp_dir.path().join("readme.txt").exists());
}

#[tokio::test]
async fn test_ingest_keeps_file_when_configured() {
    let temp_dir = TempDir::new().unwrap();
    let photo = temp_dir.path().join("keep.jpg");
    std::fs::write(&photo, "pixels").unwrap();

    let (handle, store) = queue_with_store();
    let inbox = watcher(temp_dir.path(), handle, false);

    assert!(inbox.ingest(&photo).await.unwrap());
    assert!(!photo.exists());
    assert!(inbox.queued_dir().join("keep.jpg").exists());
    assert_eq!(store.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_rescan_does_not_requeue_kept_files() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("a.jpg"), "pixels").unwrap();

    let (handle, store) = queue_with_store();
    let inbox = watcher(temp_dir.path(), handle.clone(), false);
    assert_eq!(inbox.scan_existing().await.unwrap(), 1);

    let restarted = watcher(temp_dir.path(), handle, false);
    assert_eq!(restarted.scan_existing().await.unwrap(), 0);

    assert_eq!(store.list_all().await.unwrap(), vec![Bytes::from("pixels")]);
    assert_eq!(
        std::fs::read(temp_dir.path().join(".queued").join("a.jpg")).unwrap(),
        b"pixels"
    );
}

#[tokio::test]
async fn test_ingest_missing_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let (handle, store) = queue_with_store();
    let inbox = watcher(temp_dir.path(), handle, true);

    assert!(!inbox.ingest(&temp_dir.path().join("gone.jpg")).await.unwrap());
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_watcher_queues_new_files() {
    let temp_dir = TempDir::new().unwrap();
    let (handle, store) = queue_with_store();
    let running = watcher(temp_dir.path(), handle, true).start().unwrap();

    let photo = temp_dir.path().join("new.jpg");
    std::fs::write(&photo, "fresh capture").unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        while store.len().await.unwrap() == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(
        store.list_all().await.unwrap(),
        vec![Bytes::from("fresh capture")]
    );
    drop(running);
}
