use clap::Args;

use secure_share_daemon::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port the relay listens on
    #[arg(long, default_value_t = 4000)]
    pub port: u16,

    /// Secret store url: memory:// or redis://host:port/db
    #[arg(long, default_value = "memory://")]
    pub store_url: String,

    /// Public origin to render share links against
    #[arg(long)]
    pub share_origin: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] secure_share_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            port: self.port,
            store_url: self.store_url.clone(),
            share_origin: self.share_origin.clone(),
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized secure-share config at: {}\n\
             - Config: {}\n\
             - Port: {}\n\
             - Store: {}\n\
             - Default TTL: {}s (max {}s)",
            state.config_dir.display(),
            state.config_path.display(),
            state.config.port,
            state.config.store_url,
            state.config.default_ttl_secs,
            state.config.max_ttl_secs,
        );

        Ok(output)
    }
}
