use std::time::Duration;

use reqwest::{header::HeaderMap, header::HeaderValue, Client, Request, Response};
use url::Url;

use super::error::ApiError;
use super::retry::RetryPolicy;
use super::ApiRequest;

/// Generous, since clients are often on slow mobile links
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        Ok(Self {
            remote: remote.clone(),
            client: build_client(REQUEST_TIMEOUT)?,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ApiError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request = request.build_request(&self.remote, &self.client)?.build()?;
        let response = self.execute(request).await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        if !self.retry.applies_to(request.method()) {
            return self.client.execute(request).await;
        }

        let mut retry = 0;
        loop {
            // bodies that can't be cloned get exactly one attempt
            let Some(attempt) = request.try_clone() else {
                return self.client.execute(request).await;
            };

            match self.client.execute(attempt).await {
                Err(e) if RetryPolicy::is_retryable(&e) => {
                    retry += 1;
                    let Some(delay) = self.retry.delay_for(retry) else {
                        return Err(e);
                    };
                    tracing::warn!(
                        "retrying {} ({}/{}) in {:?}: {}",
                        request.url(),
                        retry,
                        self.retry.max_retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    Client::builder()
        .default_headers(default_headers)
        .timeout(timeout)
        .build()
}
