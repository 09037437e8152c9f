//! One-time secret endpoints
//!
//! - `POST /api/secret` stores an encrypted payload and returns its id
//! - `GET /api/secret/:id` hands the payload out once, then it is gone
//!
//! Both endpoints only ever see ciphertext and IV. Error bodies are JSON
//! objects with an `error` field; storage failures never leak backend detail.

pub mod create;
pub mod fetch;

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

pub use create::{CreateRequest, CreateResponse};
pub use fetch::{FetchRequest, FetchResponse};

/// Body of every 500 from this module
pub(crate) fn internal_error() -> Response {
    let msg = serde_json::json!({"error": "Internal error"});
    (StatusCode::INTERNAL_SERVER_ERROR, Json(msg)).into_response()
}
