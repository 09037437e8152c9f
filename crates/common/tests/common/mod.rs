//! Shared helpers for secret store integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ::common::record_id::RecordId;
use ::common::store::{EncryptedPayload, SecretStore, StoreConfig, StoreError};

/// Env var pointing at a disposable Redis instance; Redis tests skip without it
pub const REDIS_URL_ENV: &str = "SECURE_SHARE_TEST_REDIS_URL";

pub fn payload(tag: &str) -> EncryptedPayload {
    EncryptedPayload {
        cipher_text: format!("cipher-{}", tag),
        iv: format!("iv-{}", tag),
    }
}

/// Connect to the test Redis instance, or `None` if none is configured
pub async fn redis_store() -> Option<Arc<dyn SecretStore>> {
    let url = std::env::var(REDIS_URL_ENV).ok()?;
    let config = StoreConfig::from_url(&url).expect("test redis url must be redis://");
    Some(config.connect().await.expect("failed to connect to test redis"))
}

/// Behaviour every backend must share
pub async fn assert_store_contract(store: Arc<dyn SecretStore>) {
    store.ping().await.unwrap();

    // exactly once
    let id = RecordId::generate();
    store
        .put(&id, payload("once"), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("once")));
    assert_eq!(store.take_once(&id).await.unwrap(), None);

    // never stored
    assert_eq!(store.take_once(&RecordId::generate()).await.unwrap(), None);

    // live collision
    let id = RecordId::generate();
    store
        .put(&id, payload("first"), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(matches!(
        store
            .put(&id, payload("second"), Duration::from_secs(60))
            .await,
        Err(StoreError::Conflict(_))
    ));
    assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("first")));

    // zero ttl
    assert!(matches!(
        store
            .put(&RecordId::generate(), payload("zero"), Duration::ZERO)
            .await,
        Err(StoreError::InvalidTtl)
    ));
}

/// Race `readers` concurrent takes of one record and count how many won
pub async fn race_take_once(store: Arc<dyn SecretStore>, readers: usize) -> usize {
    let id = RecordId::generate();
    store
        .put(&id, payload("race"), Duration::from_secs(60))
        .await
        .unwrap();

    let barrier = Arc::new(tokio::sync::Barrier::new(readers));
    let takes = (0..readers).map(|_| {
        let store = store.clone();
        let id = id.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            store.take_once(&id).await.unwrap()
        })
    });

    futures::future::join_all(takes)
        .await
        .into_iter()
        .filter(|taken| matches!(taken, Ok(Some(_))))
        .count()
}
