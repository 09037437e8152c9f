use axum::routing::{get, post};
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod client;
pub mod secret;

use super::Config;
use crate::ServiceState;

pub fn router(state: ServiceState, config: &Config) -> Router<ServiceState> {
    let allow_origin = if config.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(config.cors_origins.clone())
    };

    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(allow_origin)
        .allow_credentials(false);

    Router::new()
        .route("/secret", post(secret::create::handler))
        .route("/secret/:id", get(secret::fetch::handler))
        .with_state(state)
        .layer(cors_layer)
}
