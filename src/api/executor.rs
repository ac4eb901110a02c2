//! Retrying request execution.
//!
//! Every outbound call funnels through `RequestExecutor::execute`: it takes
//! a rate-limiter token per attempt (retries are not free), interprets the
//! HTTP status, and applies exponential backoff to transient failures. This
//! is the single place status codes are classified; callers only ever see
//! an `ApiError`.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::limiter::RateLimiter;
use crate::api::transport::{ApiRequest, Transport};

/// Default number of attempts per request.
pub const DEFAULT_RETRIES: usize = 3;

/// Default base for the exponential backoff, in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;

/// Issues one logical API call with bounded retries.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retries: usize,
    backoff_factor: f64,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Self::with_policy(transport, limiter, DEFAULT_RETRIES, DEFAULT_BACKOFF_FACTOR)
    }

    pub fn with_policy(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        retries: usize,
        backoff_factor: f64,
    ) -> Self {
        debug_assert!(retries >= 1, "at least one attempt is required");
        Self {
            transport,
            limiter,
            retries,
            backoff_factor,
        }
    }

    /// Execute the request and decode a 2xx body as `T`.
    ///
    /// Policy per attempt: acquire a limiter token, send, then
    /// - 2xx: decode and return;
    /// - 429: sleep the backoff and re-attempt (the backoff itself provides
    ///   the throttling slack, on top of the token already spent);
    /// - other status: terminal immediately, carrying status and body;
    /// - transport failure: retry with backoff, terminal on the last attempt
    ///   with the transport error text.
    ///
    /// Running out of attempts yields `ApiError::RetriesExhausted`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        for attempt in 0..self.retries {
            self.limiter.acquire().await;

            match self.transport.send(&request).await {
                Ok(response) if response.is_success() => {
                    return serde_json::from_str(&response.body)
                        .map_err(|e| ApiError::Decode(e.to_string()));
                }
                Ok(response) if response.status == 429 => {
                    if attempt + 1 == self.retries {
                        break;
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        url = %request.url,
                        "Rate limit hit, retrying after {:.1}s",
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                }
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, "Terminal HTTP error");
                    return Err(ApiError::Status {
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(err) => {
                    if attempt + 1 == self.retries {
                        return Err(ApiError::Transport(err.to_string()));
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        url = %request.url,
                        "Transport error ({err}), retrying after {:.1}s",
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                }
            }
        }

        Err(ApiError::RetriesExhausted)
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(attempt as i32))
    }
}
