//! Ephemeral, read-once storage for encrypted secrets
//!
//! The store only ever holds ciphertext and IV. Every record carries a TTL and
//! is destroyed by whichever comes first: the first successful
//! [`SecretStore::take_once`] or expiry. Backends must make take-once a single
//! indivisible fetch-and-remove; two concurrent readers of the same id can
//! never both receive the payload.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: in-process, per-record eviction timers. Guarantees only
//!   hold inside one process; use it for development and tests.
//! - [`RedisStore`]: networked, built on `SET .. PX .. NX` and `GETDEL`. Use it
//!   whenever more than one server instance shares the same secrets.
//!
//! Which one runs is decided once at startup from a [`StoreConfig`].

mod memory;
mod networked;

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::record_id::RecordId;

pub use memory::MemoryStore;
pub use networked::RedisStore;

/// Ciphertext and IV exactly as the client submitted them
///
/// Useless without the key, which never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub cipher_text: String,
    pub iv: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An unexpired record already exists under this id
    #[error("record {0} already exists")]
    Conflict(RecordId),
    #[error("ttl must be greater than zero")]
    InvalidTtl,
    #[error("store backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("stored record could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unsupported store url: {0}")]
    UnsupportedUrl(String),
}

#[async_trait]
pub trait SecretStore: Send + Sync + Debug + 'static {
    /// Store `payload` under `id` for at most `ttl`
    ///
    /// Ids are expected to be freshly generated. Inserting over a live record
    /// is rejected with [`StoreError::Conflict`] so the caller can pick a new
    /// id; a record that has already expired may be replaced.
    async fn put(
        &self,
        id: &RecordId,
        payload: EncryptedPayload,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Atomically fetch and remove the record under `id`
    ///
    /// Returns `Ok(None)` when the id never existed, was already taken, or
    /// has expired. Those cases are deliberately indistinguishable.
    async fn take_once(&self, id: &RecordId) -> Result<Option<EncryptedPayload>, StoreError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub type DynSecretStore = Arc<dyn SecretStore>;

/// Backend selection, parsed from a store url
///
/// - `memory://` selects [`MemoryStore`]
/// - `redis://..` or `rediss://..` selects [`RedisStore`]
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Redis { url: String },
}

impl StoreConfig {
    pub const MEMORY_URL: &'static str = "memory://";

    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if url == Self::MEMORY_URL || url == "memory" {
            return Ok(Self::Memory);
        }
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "redis" | "rediss") => Ok(Self::Redis {
                url: url.to_string(),
            }),
            _ => Err(StoreError::UnsupportedUrl(redact(url))),
        }
    }

    /// Construct the configured backend
    ///
    /// The returned handle is meant to be created once and shared for the
    /// lifetime of the process.
    pub async fn connect(&self) -> Result<DynSecretStore, StoreError> {
        match self {
            StoreConfig::Memory => {
                tracing::info!("using in-process secret store (single instance only)");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreConfig::Redis { url } => {
                tracing::info!(url = %redact(url), "connecting to redis secret store");
                Ok(Arc::new(RedisStore::connect(url).await?))
            }
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreConfig::Memory => f.write_str(Self::MEMORY_URL),
            StoreConfig::Redis { url } => f.write_str(&redact(url)),
        }
    }
}

// urls may carry credentials, so never print them as-is
impl Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreConfig({})", self)
    }
}

fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}
