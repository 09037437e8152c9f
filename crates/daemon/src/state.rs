use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use common::store::StoreConfig;

pub const APP_NAME: &str = "secure-share";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`
///
/// Every field has a default, so a partial (or missing) file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the relay listens on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret store backend: `memory://` or `redis://host:port/db`
    #[serde(default = "default_store_url")]
    pub store_url: String,
    /// TTL applied when a client does not ask for one
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Longest TTL a client may ask for
    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,
    /// Largest accepted request body
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Origins allowed by CORS; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Public origin used when rendering share links, if it differs from
    ///  the address the client talks to
    #[serde(default)]
    pub share_origin: Option<String>,
    /// Directory for log files (stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    4000
}

fn default_store_url() -> String {
    StoreConfig::MEMORY_URL.to_string()
}

fn default_ttl_secs() -> u64 {
    60 * 60
}

/// Hard ceiling on any secret's lifetime (7 days); `max_ttl_secs` may only lower it
pub const TTL_CEILING_SECS: u64 = 7 * 24 * 60 * 60;

fn default_max_ttl_secs() -> u64 {
    TTL_CEILING_SECS
}

fn default_body_limit_bytes() -> usize {
    256 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            store_url: default_store_url(),
            default_ttl_secs: default_ttl_secs(),
            max_ttl_secs: default_max_ttl_secs(),
            body_limit_bytes: default_body_limit_bytes(),
            cors_origins: Vec::new(),
            share_origin: None,
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the config directory (~/.secure-share)
    pub config_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the config directory path (custom or default ~/.secure-share)
    pub fn config_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Write a fresh config file
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let config_dir = Self::config_dir(custom_path)?;
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&config_dir)?;

        let config = config.unwrap_or_default();
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            config_dir,
            config_path,
            config,
        })
    }

    /// Load existing state, failing if `init` was never run
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let config_dir = Self::config_dir(custom_path)?;
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            config_dir,
            config_path,
            config,
        })
    }

    /// Load state if a config file exists, otherwise fall back to defaults
    pub fn load_or_default(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        match Self::load(custom_path.clone()) {
            Err(StateError::NotInitialized) => {
                let config_dir = Self::config_dir(custom_path)?;
                Ok(Self {
                    config_path: config_dir.join(CONFIG_FILE_NAME),
                    config_dir,
                    config: AppConfig::default(),
                })
            }
            result => result,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("config not initialized. Run 'secure-share init' first")]
    NotInitialized,

    #[error("config already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let custom = Some(dir.path().join("cfg"));

        let config = AppConfig {
            port: 8123,
            store_url: "redis://localhost:6379".to_string(),
            ..AppConfig::default()
        };
        let created = AppState::init(custom.clone(), Some(config.clone())).unwrap();
        assert!(created.config_path.exists());

        let loaded = AppState::load(custom.clone()).unwrap();
        assert_eq!(loaded.config, config);

        assert!(matches!(
            AppState::init(custom, None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let custom = Some(dir.path().to_path_buf());

        assert!(matches!(
            AppState::load(custom.clone()),
            Err(StateError::NotInitialized)
        ));
        let state = AppState::load_or_default(custom).unwrap();
        assert_eq!(state.config, AppConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "port = 9000\ncors_origins = [\"https://share.example.com\"]\n",
        )
        .unwrap();

        let state = AppState::load(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(state.config.port, 9000);
        assert_eq!(state.config.cors_origins, vec!["https://share.example.com"]);
        assert_eq!(state.config.store_url, "memory://");
        assert_eq!(state.config.default_ttl_secs, 3600);
        assert_eq!(state.config.max_ttl_secs, 604800);
        assert_eq!(state.config.body_limit_bytes, 256 * 1024);
    }

    #[test]
    fn test_bad_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "port = \"not a port\"").unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().to_path_buf())),
            Err(StateError::TomlDe(_))
        ));
    }
}
