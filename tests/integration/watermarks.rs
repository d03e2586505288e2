//! Integration: watermark pointers across stores and writers.

use std::sync::Arc;

use rill_coord::{FjallCoordStore, MemoryCoordStore, WatermarkStore};
use rill_integration_tests::{key_at, MemoryHub};
use rill_types::{ContentKey, Direction, DirectionQuery};

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_watermark_tracks_tag_consumption() {
    // A replication-style consumer: read the tag's latest key, persist it
    // as the group's watermark, and never move backwards.
    let hub = MemoryHub::new();
    hub.add_channel("a", ["t".to_string()]);
    hub.add_channel("b", ["t".to_string()]);
    hub.ingest("a", key_at(5));
    hub.ingest("b", key_at(9));
    let agg = hub.aggregator();

    let watermarks = WatermarkStore::new(Arc::new(MemoryCoordStore::new()));
    watermarks.initialize("group-t", &ContentKey::zero()).await;

    let query = DirectionQuery::new(key_at(60), Direction::Previous, 1);
    let latest = agg.get_latest("t", &query).await.unwrap().unwrap();
    watermarks.update_increase("group-t", &latest.key).await;
    assert_eq!(
        watermarks.get("group-t", &ContentKey::zero()).await,
        key_at(9)
    );

    // New data advances the watermark; replaying old data does not move
    // it back.
    hub.ingest("a", key_at(20));
    let latest = agg.get_latest("t", &query).await.unwrap().unwrap();
    watermarks.update_increase("group-t", &latest.key).await;
    watermarks.update_increase("group-t", &key_at(9)).await;
    assert_eq!(
        watermarks.get("group-t", &ContentKey::zero()).await,
        key_at(20)
    );
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_concurrent_writers_one_store() {
    let store = Arc::new(MemoryCoordStore::new());
    let seed = WatermarkStore::new(store.clone());
    seed.initialize("group", &ContentKey::zero()).await;

    let mut handles = Vec::new();
    for writer in 0..4u64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let watermarks = WatermarkStore::new(store);
            for minute in 1..=10 {
                watermarks
                    .update_increase("group", &key_at(writer * 10 + minute))
                    .await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // The final value is one of the submitted candidates and at least as
    // large as anything a single uncontended writer would have stored.
    let stored = seed.get("group", &ContentKey::zero()).await;
    assert!(stored >= key_at(10));
    assert!((1..=40).any(|m| stored == key_at(m)));
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_watermarks_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();

    {
        let store = Arc::new(FjallCoordStore::open(&path).unwrap());
        let watermarks = WatermarkStore::new(store);
        watermarks.initialize("group", &ContentKey::zero()).await;
        watermarks.update_increase("group", &key_at(42)).await;
    }

    {
        let store = Arc::new(FjallCoordStore::open(&path).unwrap());
        let watermarks = WatermarkStore::new(store);
        assert_eq!(
            watermarks.get("group", &ContentKey::zero()).await,
            key_at(42)
        );
    }
}
