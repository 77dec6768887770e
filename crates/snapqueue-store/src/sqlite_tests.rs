use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_store_id() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    assert_eq!(store.id(), "sqlite");
}

#[tokio::test]
async fn test_append_and_list_all() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    store.append(Bytes::from_static(b"\xff\xd8jpeg-a")).await.unwrap();
    store.append(Bytes::from_static(b"\xff\xd8jpeg-b")).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], Bytes::from_static(b"\xff\xd8jpeg-a"));
    assert_eq!(all[1], Bytes::from_static(b"\xff\xd8jpeg-b"));
}

#[tokio::test]
async fn test_append_keys_increase() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    let k1 = store.append(Bytes::from("a")).await.unwrap();
    let k2 = store.append(Bytes::from("b")).await.unwrap();
    assert!(k2 > k1);
}

#[tokio::test]
async fn test_keys_not_reused_after_removing_newest() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    let k1 = store.append(Bytes::from("only")).await.unwrap();
    store.remove_oldest().await.unwrap();

    let k2 = store.append(Bytes::from("next")).await.unwrap();
    assert!(k2 > k1);
}

#[tokio::test]
async fn test_remove_oldest_removes_exactly_one() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    for payload in ["x", "y", "z"] {
        store.append(Bytes::from(payload)).await.unwrap();
    }

    store.remove_oldest().await.unwrap();
    assert_eq!(
        store.list_all().await.unwrap(),
        vec![Bytes::from("y"), Bytes::from("z")]
    );
    assert_eq!(store.len().await.unwrap(), 2);
}

#[tokio::test]
async fn test_remove_oldest_on_empty_store() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    store.remove_oldest().await.unwrap();
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_payload_roundtrip() {
    let store = SqliteQueueStore::in_memory().await.unwrap();
    store.append(Bytes::new()).await.unwrap();
    assert_eq!(store.list_all().await.unwrap(), vec![Bytes::new()]);
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("queue.db");

    {
        let store = SqliteQueueStore::open(&path).await.unwrap();
        store.append(Bytes::from("X")).await.unwrap();
        store.append(Bytes::from("Y")).await.unwrap();
    }

    let reopened = SqliteQueueStore::open(&path).await.unwrap();
    assert_eq!(
        reopened.list_all().await.unwrap(),
        vec![Bytes::from("X"), Bytes::from("Y")]
    );
}

#[tokio::test]
async fn test_open_corrupted_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("queue.db");
    std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

    let result = SqliteQueueStore::open(&path).await;
    assert!(matches!(result, Err(StoreError::Corrupted(_))));
}
