#[allow(clippy::module_inception)]
mod client;
mod error;
mod retry;

pub use client::{ApiClient, REQUEST_TIMEOUT};
pub use error::ApiError;
pub use retry::RetryPolicy;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError>;
}
