use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{EncryptedPayload, SecretStore, StoreError};
use crate::record_id::RecordId;

/// In-process secret store
///
/// Records live in a map behind a single mutex. Every record owns a spawned
/// eviction task that sleeps until the record's deadline; reading the record
/// aborts that task, and the task only removes the entry if it still belongs
/// to the generation it was spawned for. Both removal paths go through the
/// same lock, so exactly one of them wins.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    entries: HashMap<RecordId, Entry>,
    /// Bumped on every insert so a stale evictor can't remove a newer record
    next_generation: u64,
}

#[derive(Debug)]
struct Entry {
    payload: EncryptedPayload,
    expires_at: Instant,
    generation: u64,
    evictor: JoinHandle<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, including any that have expired
    /// but whose eviction task has not run yet
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for MemoryStoreInner {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.evictor.abort();
        }
    }
}

async fn evict_at(
    inner: Weak<Mutex<MemoryStoreInner>>,
    id: RecordId,
    generation: u64,
    deadline: Instant,
) {
    tokio::time::sleep_until(deadline).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = inner.lock();
    let current = inner
        .entries
        .get(&id)
        .is_some_and(|entry| entry.generation == generation);
    if current {
        inner.entries.remove(&id);
        tracing::debug!(%id, "secret expired unread");
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn put(
        &self,
        id: &RecordId,
        payload: EncryptedPayload,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl);
        }

        let now = Instant::now();
        let expires_at = now + ttl;

        let mut inner = self.inner.lock();
        if let Some(existing) = inner.entries.get(id) {
            if existing.expires_at > now {
                return Err(StoreError::Conflict(id.clone()));
            }
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let evictor = tokio::spawn(evict_at(
            Arc::downgrade(&self.inner),
            id.clone(),
            generation,
            expires_at,
        ));

        let entry = Entry {
            payload,
            expires_at,
            generation,
            evictor,
        };
        if let Some(stale) = inner.entries.insert(id.clone(), entry) {
            stale.evictor.abort();
        }

        tracing::debug!(%id, ttl_ms = ttl.as_millis() as u64, "secret stored");
        Ok(())
    }

    async fn take_once(&self, id: &RecordId) -> Result<Option<EncryptedPayload>, StoreError> {
        let taken = {
            let mut inner = self.inner.lock();
            let now = Instant::now();
            inner
                .entries
                .remove(id)
                .map(|entry| (entry.expires_at > now, entry))
        };

        match taken {
            Some((live, entry)) => {
                entry.evictor.abort();
                if live {
                    tracing::debug!(%id, "secret taken");
                    Ok(Some(entry.payload))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(tag: &str) -> EncryptedPayload {
        EncryptedPayload {
            cipher_text: format!("cipher-{}", tag),
            iv: format!("iv-{}", tag),
        }
    }

    #[tokio::test]
    async fn test_take_once_is_exactly_once() {
        let store = MemoryStore::new();
        let id = RecordId::generate();

        store
            .put(&id, payload("a"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("a")));
        assert_eq!(store.take_once(&id).await.unwrap(), None);
        assert_eq!(store.take_once(&id).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_absent() {
        let store = MemoryStore::new();
        let id: RecordId = "never-stored".parse().unwrap();
        assert_eq!(store.take_once(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let store = MemoryStore::new();
        let id = RecordId::generate();
        assert!(matches!(
            store.put(&id, payload("a"), Duration::ZERO).await,
            Err(StoreError::InvalidTtl)
        ));
    }

    #[tokio::test]
    async fn test_live_collision_rejected() {
        let store = MemoryStore::new();
        let id = RecordId::generate();

        store
            .put(&id, payload("a"), Duration::from_secs(60))
            .await
            .unwrap();
        let err = store
            .put(&id, payload("b"), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref conflicting) if *conflicting == id));

        // the original record is untouched
        assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("a")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_record_is_evicted() {
        let store = MemoryStore::new();
        let id = RecordId::generate();

        store
            .put(&id, payload("a"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(store.is_empty());
        assert_eq!(store.take_once(&id).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_before_expiry_cancels_eviction() {
        let store = MemoryStore::new();
        let id = RecordId::generate();

        store
            .put(&id, payload("a"), Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("a")));

        // a new record under the same id must not be removed by the old timer
        store
            .put(&id, payload("b"), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_slot_can_be_reused() {
        let store = MemoryStore::new();
        let id = RecordId::generate();

        store
            .put(&id, payload("a"), Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        store
            .put(&id, payload("b"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.take_once(&id).await.unwrap(), Some(payload("b")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_takes_have_one_winner() {
        let store = MemoryStore::new();

        for round in 0..20 {
            let id = RecordId::generate();
            store
                .put(&id, payload(&round.to_string()), Duration::from_secs(60))
                .await
                .unwrap();

            let barrier = Arc::new(tokio::sync::Barrier::new(50));
            let handles: Vec<_> = (0..50)
                .map(|_| {
                    let store = store.clone();
                    let id = id.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        store.take_once(&id).await.unwrap()
                    })
                })
                .collect();

            let mut winners = 0;
            for handle in handles {
                if handle.await.unwrap().is_some() {
                    winners += 1;
                }
            }
            assert_eq!(winners, 1, "round {}", round);
        }
        assert!(store.is_empty());
    }
}
