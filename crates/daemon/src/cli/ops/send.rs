use clap::Args;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use url::Url;

use common::crypto::{encrypt, EncryptionMaterial};
use common::share_link::build_share_url;
use secure_share_daemon::http_server::api::client::ApiError;
use secure_share_daemon::http_server::api::secret::{CreateRequest, CreateResponse};
use secure_share_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct SendSecret {
    /// Secret to share; read from stdin when omitted
    pub text: Option<String>,

    /// Seconds until the secret expires unread (relay default if unset)
    #[arg(long)]
    pub expires_in: Option<u64>,

    /// Origin to render the share link against (defaults to the relay url)
    #[arg(long)]
    pub origin: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("nothing to share: the secret is empty")]
    Empty,
    #[error("failed to read secret from stdin: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl SendSecret {
    async fn secret(&self) -> Result<String, SendError> {
        let text = match &self.text {
            Some(text) => text.clone(),
            None => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                // drop the newline a shell pipe leaves behind
                buf.strip_suffix('\n')
                    .map(|s| s.strip_suffix('\r').unwrap_or(s))
                    .unwrap_or(buf.as_str())
                    .to_string()
            }
        };
        if text.is_empty() {
            return Err(SendError::Empty);
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendSecret {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = self.secret().await?;

        // key and IV never leave this process except inside the link fragment
        let material = EncryptionMaterial::generate();
        let request = CreateRequest {
            cipher_text: encrypt(&secret, &material),
            iv: material.iv_b64(),
            expires_in: self.expires_in,
        };

        let response: CreateResponse = ctx.client.call(request).await?;

        let configured_origin = AppState::load(ctx.config_path.clone())
            .ok()
            .and_then(|state| state.config.share_origin);
        let origin = match (&self.origin, configured_origin) {
            (Some(origin), _) => origin.to_string(),
            (None, Some(origin)) => origin,
            (None, None) => ctx.client.base_url().to_string(),
        };

        let link = build_share_url(
            &origin,
            response.id.as_str(),
            &material.key_b64(),
            &material.iv_b64(),
        );

        let expires = OffsetDateTime::from_unix_timestamp_nanos(
            i128::from(response.expires_at) * 1_000_000,
        )
        .ok()
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| response.expires_at.to_string());

        Ok(format!("{}\nexpires: {} (viewable once)", link, expires))
    }
}
