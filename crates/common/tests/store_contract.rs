//! Integration tests for the secret store backends

mod common;

use std::sync::Arc;
use std::time::Duration;

use ::common::record_id::RecordId;
use ::common::store::{MemoryStore, SecretStore, StoreConfig};

use crate::common::{assert_store_contract, payload, race_take_once, redis_store, REDIS_URL_ENV};

#[tokio::test]
async fn test_memory_store_contract() {
    let store = StoreConfig::from_url("memory://")
        .unwrap()
        .connect()
        .await
        .unwrap();
    assert_store_contract(store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_memory_store_fifty_concurrent_readers() {
    let store: Arc<dyn SecretStore> = Arc::new(MemoryStore::new());
    for _ in 0..10 {
        assert_eq!(race_take_once(store.clone(), 50).await, 1);
    }
}

#[tokio::test]
async fn test_memory_store_expires_in_real_time() {
    let store = MemoryStore::new();
    let id = RecordId::generate();
    store
        .put(&id, payload("ttl"), Duration::from_secs(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(store.take_once(&id).await.unwrap(), None);
    assert!(store.is_empty(), "expired record should not linger");
}

#[tokio::test]
async fn test_redis_store_contract() {
    let Some(store) = redis_store().await else {
        eprintln!("{} not set, skipping", REDIS_URL_ENV);
        return;
    };
    assert_store_contract(store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_redis_store_fifty_concurrent_readers() {
    let Some(store) = redis_store().await else {
        eprintln!("{} not set, skipping", REDIS_URL_ENV);
        return;
    };
    assert_eq!(race_take_once(store, 50).await, 1);
}

#[tokio::test]
async fn test_redis_store_expires() {
    let Some(store) = redis_store().await else {
        eprintln!("{} not set, skipping", REDIS_URL_ENV);
        return;
    };
    let id = RecordId::generate();
    store
        .put(&id, payload("ttl"), Duration::from_secs(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(store.take_once(&id).await.unwrap(), None);
}
