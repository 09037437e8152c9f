//! `GET /health`, kept for clients that predate the `/_status` probes

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

#[tracing::instrument]
pub async fn handler() -> Response {
    let body = HeartbeatResponse {
        ok: true,
        time: OffsetDateTime::now_utc(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
