use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use common::store::{StoreConfig, StoreError};

use crate::state::{AppConfig, TTL_CEILING_SECS};

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the relay to listen on
    pub listen_addr: SocketAddr,
    /// largest accepted request body, in bytes
    pub body_limit: usize,
    /// origins allowed by CORS, empty allows any
    pub cors_origins: Vec<String>,

    // secret store configuration
    /// which backend holds the encrypted payloads
    pub store: StoreConfig,
    /// ttl used when a client does not ask for one
    pub default_ttl: Duration,
    /// longest ttl a client may ask for
    pub max_ttl: Duration,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Build a service config from the on-disk app config
    ///
    /// Command line overrides are applied by the caller afterwards.
    pub fn from_app_config(app: &AppConfig) -> Result<Self, ConfigError> {
        if app.default_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl("default_ttl_secs must be positive"));
        }
        if app.max_ttl_secs > TTL_CEILING_SECS {
            return Err(ConfigError::InvalidTtl(
                "max_ttl_secs must not exceed 604800 (7 days)",
            ));
        }
        if app.default_ttl_secs > app.max_ttl_secs {
            return Err(ConfigError::InvalidTtl(
                "default_ttl_secs must not exceed max_ttl_secs",
            ));
        }

        Ok(Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], app.port)),
            body_limit: app.body_limit_bytes,
            cors_origins: app.cors_origins.clone(),
            store: StoreConfig::from_url(&app.store_url)?,
            default_ttl: Duration::from_secs(app.default_ttl_secs),
            max_ttl: Duration::from_secs(app.max_ttl_secs),
            log_level: tracing::Level::INFO,
            log_dir: app.log_dir.clone(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], app.port)),
            body_limit: app.body_limit_bytes,
            cors_origins: Vec::new(),
            store: StoreConfig::Memory,
            default_ttl: Duration::from_secs(app.default_ttl_secs),
            max_ttl: Duration::from_secs(app.max_ttl_secs),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid ttl configuration: {0}")]
    InvalidTtl(&'static str),
    #[error("invalid store configuration: {0}")]
    Store(#[from] StoreError),
}
