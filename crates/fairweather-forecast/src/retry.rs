//! Retry support for weather API requests, with exponential backoff.
//!
//! Retries transient failures only: timeouts, connection resets, 5xx
//! responses, and rate limiting. 4xx client errors are permanent and fail
//! immediately.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// Default retry configuration
pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 2000;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryConfig {
    /// Create a retry config with custom settings
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Delay before the retry following `attempt` (zero-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

/// Whether a failed request should be tried again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

/// Classify a transport-level error
pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() || error.is_connect() {
        tracing::debug!("Transient network error, will retry: {}", error);
        return RetryDecision::Retry;
    }
    // Malformed requests and body errors never get better on retry.
    if error.is_request() {
        return RetryDecision::NoRetry;
    }
    match error.status() {
        Some(status) => is_retryable_status(status),
        None => RetryDecision::NoRetry,
    }
}

/// Classify a response status code
pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error() {
        return RetryDecision::Retry;
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => RetryDecision::Retry,
        _ => RetryDecision::NoRetry,
    }
}

/// Run an HTTP request, retrying transient failures with backoff.
///
/// Returns the first response with a non-retryable status, the last response
/// once retries are exhausted, or the error that ended the attempt.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt: u32 = 0;
    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt - 1);
            tracing::info!(
                "Retry attempt {} of {}, waiting {:?}",
                attempt,
                config.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) == RetryDecision::Retry
                    && attempt < config.max_retries
                {
                    tracing::warn!(
                        "Request returned {}, attempt {} of {}",
                        status,
                        attempt + 1,
                        config.max_retries + 1
                    );
                    attempt += 1;
                    continue;
                }
                if attempt > 0 {
                    tracing::info!("Request succeeded after {} retries", attempt);
                }
                return Ok(response);
            }
            Err(e) => {
                if is_retryable_error(&e) == RetryDecision::NoRetry {
                    tracing::debug!("Non-retryable error: {}", e);
                    return Err(e);
                }
                if attempt >= config.max_retries {
                    tracing::error!(
                        "All {} request attempts exhausted: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }
                tracing::warn!(
                    "Retryable error on attempt {} of {}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_matches_constants() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.initial_delay, Duration::from_millis(200));
        assert_eq!(config.max_delay, Duration::from_millis(2000));
    }

    #[test]
    fn delay_doubles_each_attempt() {
        let config = RetryConfig::new(4, 200, 5000);
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(800));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(1600));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let config = RetryConfig::new(10, 200, 2000);
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(2000));
    }

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert_eq!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::BAD_GATEWAY), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::REQUEST_TIMEOUT), RetryDecision::Retry);
    }

    #[test]
    fn client_errors_are_permanent() {
        assert_eq!(is_retryable_status(StatusCode::BAD_REQUEST), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::NOT_FOUND), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::UNAUTHORIZED), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::OK), RetryDecision::NoRetry);
    }
}
