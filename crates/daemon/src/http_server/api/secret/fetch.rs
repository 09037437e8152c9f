use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use http::header::CACHE_CONTROL;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{EncryptedPayload, RecordId, StoreError};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub id: RecordId,
}

/// Ciphertext and IV, exactly as they were stored
pub type FetchResponse = EncryptedPayload;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, FetchError> {
    // an id we could never have issued is just another missing secret
    let id: RecordId = id.parse().map_err(|_| FetchError::NotFound)?;

    match state.store().take_once(&id).await? {
        Some(payload) => {
            tracing::info!(%id, "secret viewed");
            Ok(([(CACHE_CONTROL, "no-store")], Json(payload)))
        }
        None => Err(FetchError::NotFound),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Never existed, already viewed or expired; callers can't tell which
    #[error("secret not found or already viewed")]
    NotFound,
    #[error("secret store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        match self {
            FetchError::NotFound => {
                tracing::debug!("FETCH SECRET: not found");
                let msg = serde_json::json!({"error": "Not found or already viewed"});
                (http::StatusCode::NOT_FOUND, Json(msg)).into_response()
            }
            FetchError::Store(e) => {
                tracing::error!("FETCH SECRET ERROR: {}", e);
                super::internal_error()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for FetchRequest {
    type Response = FetchResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(&format!("/api/secret/{}", self.id))?;
        Ok(client.get(full_url))
    }
}
