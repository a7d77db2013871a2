//! HTTP execution of signed requests with bounded exponential backoff.

use crate::config::{ClientConfig, MAX_RETRY_LIMIT};
use crate::error::SqsError;
use crate::request::SignedRequest;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Retry policy for server faults.
///
/// Attempt `n` (zero-based) is preceded by a `2^n - 1` ms sleep, so the first
/// attempt is immediate and the delays grow as 0, 1, 3, 7, 15, ... ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` retries, clamped to [`MAX_RETRY_LIMIT`].
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRY_LIMIT),
        }
    }

    /// Maximum number of retries after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the zero-based attempt `attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_RETRY_LIMIT);
        Duration::from_millis((1u64 << exponent) - 1)
    }

    /// Check if another attempt should follow attempt `attempt` that returned `status`
    pub fn should_retry(&self, attempt: u32, status: u16) -> bool {
        is_server_error(status) && attempt < self.max_retries
    }
}

fn is_server_error(status: u16) -> bool {
    (500..600).contains(&status)
}

/// Status and body of the final HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends [`SignedRequest`]s as form-encoded POSTs
///
/// The underlying `reqwest::Client` is shared and never mutated. Each attempt
/// builds a new request from the immutable [`SignedRequest`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl Transport {
    /// Create a transport using an existing HTTP client
    pub fn new(http: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    /// Create a transport with an HTTP client configured from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, SqsError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SqsError::Http {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self::new(http, RetryPolicy::new(config.max_retries)))
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute `request`, retrying while the service answers with a 5xx status
    ///
    /// Returns the last response once a non-5xx status arrives or attempts run
    /// out. Network-level failures are not retried.
    pub async fn execute(&self, request: &SignedRequest) -> Result<HttpResponse, SqsError> {
        let action = request.action().unwrap_or_default();
        let mut attempt = 0;

        loop {
            let delay = self.retry.backoff_delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let response = self.send_once(request).await?;
            debug!(
                action = %action,
                attempt = attempt,
                status = response.status,
                "Received SQS response"
            );

            if !self.retry.should_retry(attempt, response.status) {
                return Ok(response);
            }

            attempt += 1;
            warn!(
                action = %action,
                attempt = attempt,
                status = response.status,
                delay_ms = self.retry.backoff_delay(attempt).as_millis() as u64,
                "Server error from SQS, retrying"
            );
        }
    }

    async fn send_once(&self, request: &SignedRequest) -> Result<HttpResponse, SqsError> {
        let response = self
            .http
            .post(request.url().clone())
            .form(request.parameters())
            .send()
            .await
            .map_err(|e| SqsError::Http {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SqsError::Http {
            message: format!("Failed to read response body: {}", e),
        })?;

        Ok(HttpResponse { status, body })
    }
}
