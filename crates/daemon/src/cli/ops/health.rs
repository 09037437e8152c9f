use clap::Args;

use secure_share_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.config_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                lines.push(format!("  port:         {}", state.config.port));
                lines.push(format!("  store:        {}", state.config.store_url));
            }
            Err(e) => {
                lines.push(format!("  {}", e));
            }
        }

        let base = ctx.client.base_url();
        let client = ctx.client.http_client();

        lines.push(String::new());
        lines.push(format!("Relay ({}):", base));

        let mut healthy = true;
        for probe in ["livez", "readyz"] {
            let url = format!(
                "{}/_status/{}",
                base.as_str().trim_end_matches('/'),
                probe
            );
            let status = match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => "OK".to_string(),
                Ok(resp) => {
                    healthy = false;
                    format!("UNHEALTHY ({})", resp.status())
                }
                Err(_) => {
                    healthy = false;
                    "NOT REACHABLE".to_string()
                }
            };
            lines.push(format!("  {:<7} {}", format!("{}:", probe), status));
        }

        if healthy {
            Ok(lines.join("\n"))
        } else {
            Err(HealthError::Failed(format!("\n{}", lines.join("\n"))))
        }
    }
}
