use std::collections::BTreeMap;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use common::prelude::{EncryptedPayload, RecordId, StoreError};

use crate::http_server::api::client::ApiRequest;
use crate::service_state::TtlPolicy;
use crate::ServiceState;

/// Attempts at finding an unused id before giving up
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Base64 ciphertext
    pub cipher_text: String,
    /// Base64 IV the ciphertext was produced with
    pub iv: String,
    /// Requested lifetime in seconds; may be left out but never `null`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_seconds"
    )]
    pub expires_in: Option<u64>,
}

// only runs when the field is present, so an explicit null fails as a u64
fn present_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub id: RecordId,
    /// Unix epoch milliseconds after which the secret is gone
    pub expires_at: i64,
}

impl CreateRequest {
    /// Check the request against `policy`, returning the ttl to store with
    pub fn validate(&self, policy: TtlPolicy) -> Result<Duration, ValidationDetails> {
        let mut details = ValidationDetails::default();

        if self.cipher_text.is_empty() {
            details.field("cipherText", "must not be empty");
        }
        if self.iv.is_empty() {
            details.field("iv", "must not be empty");
        }

        let ttl = match self.expires_in {
            None => policy.default,
            Some(0) => {
                details.field("expiresIn", "must be at least 1");
                policy.default
            }
            Some(secs) if Duration::from_secs(secs) > policy.max => {
                details.field(
                    "expiresIn",
                    format!("must be at most {}", policy.max.as_secs()),
                );
                policy.default
            }
            Some(secs) => Duration::from_secs(secs),
        };

        if details.is_empty() {
            Ok(ttl)
        } else {
            Err(details)
        }
    }
}

/// Why a create request was rejected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    /// Problems with the body as a whole
    pub form_errors: Vec<String>,
    /// Problems with individual fields, keyed by wire name
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationDetails {
    fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            ..Self::default()
        }
    }

    fn field(&mut self, name: &str, message: impl Into<String>) {
        self.field_errors
            .entry(name.to_string())
            .or_default()
            .push(message.into());
    }

    fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CreateError> {
    let Json(req) = payload?;
    let ttl = req.validate(state.ttl()).map_err(CreateError::Validation)?;

    let payload = EncryptedPayload {
        cipher_text: req.cipher_text,
        iv: req.iv,
    };

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let id = RecordId::generate();
        match state.store().put(&id, payload.clone(), ttl).await {
            Ok(()) => {
                let expires_at = OffsetDateTime::now_utc() + ttl;
                tracing::info!(%id, ttl_secs = ttl.as_secs(), "secret created");
                return Ok(Json(CreateResponse {
                    id,
                    expires_at: (expires_at.unix_timestamp_nanos() / 1_000_000) as i64,
                }));
            }
            Err(StoreError::Conflict(_)) => {
                tracing::warn!(attempt, "generated secret id already in use, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CreateError::IdsExhausted)
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("invalid payload")]
    Validation(ValidationDetails),
    #[error("payload too large")]
    TooLarge,
    #[error("no free secret id after {} attempts", MAX_ID_ATTEMPTS)]
    IdsExhausted,
    #[error("secret store error: {0}")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for CreateError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == http::StatusCode::PAYLOAD_TOO_LARGE {
            return CreateError::TooLarge;
        }
        CreateError::Validation(ValidationDetails::form(rejection.body_text()))
    }
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::Validation(details) => {
                tracing::warn!("CREATE SECRET: rejected payload: {:?}", details);
                let msg = serde_json::json!({
                    "error": "Invalid payload",
                    "details": details,
                });
                (http::StatusCode::BAD_REQUEST, Json(msg)).into_response()
            }
            CreateError::TooLarge => {
                tracing::warn!("CREATE SECRET: payload exceeds body limit");
                let msg = serde_json::json!({"error": "Payload too large"});
                (http::StatusCode::PAYLOAD_TOO_LARGE, Json(msg)).into_response()
            }
            err => {
                tracing::error!("CREATE SECRET ERROR: {}", err);
                super::internal_error()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/secret")?;
        Ok(client.post(full_url).json(&self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(expires_in: Option<u64>) -> CreateRequest {
        CreateRequest {
            cipher_text: "Y2lwaGVy".to_string(),
            iv: "aXY=".to_string(),
            expires_in,
        }
    }

    #[test]
    fn test_validate_ttl() {
        let policy = TtlPolicy::default();

        assert_eq!(request(None).validate(policy), Ok(Duration::from_secs(3600)));
        assert_eq!(request(Some(60)).validate(policy), Ok(Duration::from_secs(60)));
        assert_eq!(
            request(Some(604800)).validate(policy),
            Ok(Duration::from_secs(604800))
        );

        let details = request(Some(9999999)).validate(policy).unwrap_err();
        assert!(details.field_errors.contains_key("expiresIn"));
        let details = request(Some(0)).validate(policy).unwrap_err();
        assert!(details.field_errors.contains_key("expiresIn"));
    }

    #[test]
    fn test_validate_empty_fields() {
        let req = CreateRequest {
            cipher_text: String::new(),
            iv: String::new(),
            expires_in: None,
        };
        let details = req.validate(TtlPolicy::default()).unwrap_err();
        assert_eq!(
            details.field_errors.keys().collect::<Vec<_>>(),
            vec!["cipherText", "iv"]
        );
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(request(Some(10))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cipherText": "Y2lwaGVy", "iv": "aXY=", "expiresIn": 10})
        );
        let json = serde_json::to_value(request(None)).unwrap();
        assert!(json.get("expiresIn").is_none());
    }

    #[test]
    fn test_expires_in_absent_or_null() {
        let req: CreateRequest =
            serde_json::from_value(serde_json::json!({"cipherText": "Y2lwaGVy", "iv": "aXY="}))
                .unwrap();
        assert_eq!(req.expires_in, None);

        let req: CreateRequest = serde_json::from_value(
            serde_json::json!({"cipherText": "Y2lwaGVy", "iv": "aXY=", "expiresIn": 30}),
        )
        .unwrap();
        assert_eq!(req.expires_in, Some(30));

        let null = serde_json::from_value::<CreateRequest>(
            serde_json::json!({"cipherText": "Y2lwaGVy", "iv": "aXY=", "expiresIn": null}),
        );
        assert!(null.is_err());
    }
}
