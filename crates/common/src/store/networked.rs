use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{EncryptedPayload, SecretStore, StoreError};
use crate::record_id::RecordId;

/// Key namespace shared with the other SecureShare server implementations
pub const KEY_PREFIX: &str = "secret:";

/// Redis-backed secret store
///
/// Records are stored as the JSON encoded [`EncryptedPayload`] under
/// `secret:{id}` with a native expiry. Take-once is a single `GETDEL`, so the
/// server decides which of several concurrent readers gets the record
/// (requires Redis 6.2 or newer).
///
/// The connection manager reconnects on its own; errors are surfaced to the
/// caller and never retried here.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    fn key(id: &RecordId) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretStore for RedisStore {
    async fn put(
        &self,
        id: &RecordId,
        payload: EncryptedPayload,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl);
        }
        let ttl_ms = (ttl.as_millis() as u64).max(1);
        let value = serde_json::to_string(&payload)?;

        let mut conn = self.conn.clone();
        // NX: nil reply means the key is already live
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(id))
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        match reply {
            Some(_) => {
                tracing::debug!(%id, ttl_ms, "secret stored");
                Ok(())
            }
            None => Err(StoreError::Conflict(id.clone())),
        }
    }

    async fn take_once(&self, id: &RecordId) -> Result<Option<EncryptedPayload>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;

        match raw {
            Some(raw) => {
                tracing::debug!(%id, "secret taken");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
