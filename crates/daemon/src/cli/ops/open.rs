use clap::Args;

use common::crypto::{decrypt, EncryptionMaterial};
use common::record_id::RecordId;
use common::share_link::ShareLink;
use secure_share_daemon::http_server::api::secret::{FetchRequest, FetchResponse};

#[derive(Args, Debug, Clone)]
pub struct OpenSecret {
    /// Share link, including the `#key=...` fragment
    pub link: String,
}

/// Deliberately says nothing about which step failed
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("failed to retrieve or decrypt secret; it may have expired or been viewed already")]
    Failed,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for OpenSecret {
    type Error = OpenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let link: ShareLink = self.link.parse().map_err(|_| OpenError::Failed)?;
        let id: RecordId = link.id.parse().map_err(|_| OpenError::Failed)?;
        // reject bad key material before the one and only read
        let material =
            EncryptionMaterial::from_base64(&link.key, &link.iv).map_err(|_| OpenError::Failed)?;

        let payload: FetchResponse = ctx
            .client
            .call(FetchRequest { id })
            .await
            .map_err(|_| OpenError::Failed)?;

        match decrypt(&payload.cipher_text, &material) {
            Ok(plaintext) if !plaintext.is_empty() => Ok(plaintext),
            _ => Err(OpenError::Failed),
        }
    }
}
