use std::time::Duration;

use reqwest::Method;

/// Retry schedule for idempotent requests
///
/// Only `GET` requests that never reached the relay (the connection could
/// not be established) are retried. A timed out read may already have
/// consumed the secret, and anything the relay actually answered, error
/// statuses included, is returned as is. Creating a secret is never retried
/// since a lost response could otherwise store it twice.
///
/// Retry `n` (1-based) waits `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn applies_to(&self, method: &Method) -> bool {
        *method == Method::GET
    }

    pub fn is_retryable(error: &reqwest::Error) -> bool {
        error.is_connect()
    }

    /// Delay before the given retry, or `None` once retries are used up
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        Some(self.base_delay.saturating_mul(2u32.saturating_pow(retry)))
    }
}
