use std::path::PathBuf;

use clap::Args;

use common::store::StoreConfig;
use secure_share_daemon::service_config::ConfigError;
use secure_share_daemon::state::AppState;
use secure_share_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override listen port (default from config, then 4000)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Secret store url: memory:// or redis://host:port/db (falls back to REDIS_URL)
    #[arg(long, env = "SECURE_SHARE_STORE_URL")]
    pub store_url: Option<String>,

    /// Comma separated origins allowed by CORS (any if unset)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value_t = tracing::Level::INFO)]
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] secure_share_daemon::state::StateError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl Daemon {
    /// Layer command line and environment overrides on top of the config file
    pub fn service_config(&self, state: &AppState) -> Result<ServiceConfig, DaemonError> {
        let mut config = ServiceConfig::from_app_config(&state.config)?;

        if let Some(port) = self.port {
            config.listen_addr.set_port(port);
        }
        let store_url = self
            .store_url
            .clone()
            .or_else(|| std::env::var("REDIS_URL").ok());
        if let Some(url) = store_url {
            config.store = StoreConfig::from_url(&url).map_err(ConfigError::from)?;
        }
        if let Some(origins) = &self.cors_origins {
            config.cors_origins = origins
                .iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }
        if self.log_dir.is_some() {
            config.log_dir = self.log_dir.clone();
        }
        config.log_level = self.log_level;

        Ok(config)
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // The config file is optional for the daemon; defaults apply without it
        let state = AppState::load_or_default(ctx.config_path.clone())?;
        let config = self.service_config(&state)?;

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
