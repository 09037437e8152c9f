use std::time::Duration;

use common::store::{DynSecretStore, StoreError};

use super::service_config::Config;

/// Bounds on how long a secret may live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub default: Duration,
    pub max: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        let config = Config::default();
        Self {
            default: config.default_ttl,
            max: config.max_ttl,
        }
    }
}

/// Main service state, shared by every request handler
#[derive(Debug, Clone)]
pub struct State {
    store: DynSecretStore,
    ttl: TtlPolicy,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        tracing::info!(store = %config.store, "setting up secret store");
        let store = config.store.connect().await?;
        store.ping().await?;

        Ok(Self::new(
            store,
            TtlPolicy {
                default: config.default_ttl,
                max: config.max_ttl,
            },
        ))
    }

    pub fn new(store: DynSecretStore, ttl: TtlPolicy) -> Self {
        Self { store, ttl }
    }

    pub fn store(&self) -> &DynSecretStore {
        &self.store
    }

    pub fn ttl(&self) -> TtlPolicy {
        self.ttl
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("secret store setup error: {0}")]
    Store(#[from] StoreError),
}
