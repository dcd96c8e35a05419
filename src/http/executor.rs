//! Request execution with retry
//!
//! Each logical call moves through `attempt -> success | fail fast | retry`.
//! 5xx responses and transport failures are retried with exponential backoff
//! until the retry budget is spent; every other non-2xx status fails at once.
//! Cancellation aborts an in-flight attempt or a backoff wait immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::http::transport::{ApiRequest, RawResponse, Transport};

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Largest retry budget whose backoff still doubles on every retry.
pub const MAX_RETRY_ATTEMPTS: u32 = 32;

// == Retry Policy ==
/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retry_attempts: u32,
    /// Delay before the first retry; doubles for each following retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the default one-second base delay.
    pub fn new(max_retry_attempts: u32) -> Self {
        Self {
            max_retry_attempts,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Overrides the base delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry `retry` (0-indexed): `base_delay * 2^retry`, saturating.
    ///
    /// The factor caps at `u32::MAX` from retry 32 on, so delays only strictly
    /// increase up to [`MAX_RETRY_ATTEMPTS`] retries.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

// == Retry State ==
/// Progress of one logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    last_error: Option<ApiError>,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            last_error: None,
        }
    }

    /// Zero-based index of the current attempt; also the number of retries so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Most recent retryable failure.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Whether another attempt is allowed.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Records `error` and advances to the next attempt, returning the retry index.
    fn advance(&mut self, error: ApiError) -> u32 {
        let retry = self.attempt;
        self.last_error = Some(error);
        self.attempt += 1;
        retry
    }
}

// == Request Executor ==
/// Runs requests over a [`Transport`] with retry, backoff and error classification.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    // == Execute ==
    /// Executes `request`, retrying transient failures.
    ///
    /// Returns the first 2xx response, the first non-retryable error, or the
    /// last retryable error once the budget is spent.
    pub async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<RawResponse> {
        let mut state = RetryState::new(self.policy.max_retry_attempts);

        loop {
            let error = match self.attempt(request, cancel, state.attempt()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_retryable() || !state.can_retry() {
                if state.attempt() > 0 {
                    warn!(
                        method = %request.method,
                        endpoint = %request.endpoint,
                        attempts = state.attempt() + 1,
                        error = %error,
                        "Request failed"
                    );
                }
                return Err(error);
            }

            let delay = self.policy.delay_for(state.attempt());
            warn!(
                method = %request.method,
                endpoint = %request.endpoint,
                retry = state.attempt() + 1,
                max_retries = self.policy.max_retry_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying request"
            );
            state.advance(error);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Executes `request` exactly once, without retry.
    pub async fn execute_once(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> ApiResult<RawResponse> {
        self.attempt(request, cancel, 0).await
    }

    /// One attempt, classified.
    async fn attempt(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
        attempt: u32,
    ) -> ApiResult<RawResponse> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            attempt = attempt,
            "Sending request"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            outcome = self.transport.send(request) => outcome,
        };

        match outcome {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(ApiError::from_status(response.status, &response.text())),
            Err(e) => Err(e.into()),
        }
    }
}
