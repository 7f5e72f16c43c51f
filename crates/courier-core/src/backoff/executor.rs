//! Backoff executor: runs one unit of work with retry on rate-limit and transient failures.

use std::future::Future;

use tracing::{debug, warn};

use super::RetryPolicy;
use super::classify::classify;
use crate::domain::{ClassifiedError, UpstreamError};

/// Run `work`, retrying `RateLimited` / `Transient` failures per `policy`.
///
/// `AuthExpired`, `QuotaExceeded` and `Unknown` are returned after the first
/// occurrence. Retry-exhausted failures are returned as-is; there is no
/// separate "exhausted" state. No sleep happens after the final attempt.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut work: F,
) -> Result<T, ClassifiedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;

        let err = match work().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "upstream call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let classified = classify(&err).with_attempts(attempt);

        if !classified.kind.is_retryable() {
            debug!(kind = %classified.kind, attempt, error = %classified.raw, "not retrying");
            return Err(classified);
        }

        // attempt - 1 retries have been spent so far
        if attempt > policy.max_retries {
            warn!(
                kind = %classified.kind,
                attempt,
                max_retries = policy.max_retries,
                error = %classified.raw,
                "retries exhausted"
            );
            return Err(classified);
        }

        let delay = policy.delay_for(attempt, classified.retry_after);
        warn!(
            kind = %classified.kind,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %classified.raw,
            "upstream call failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

/// A reusable holder for a retry policy.
///
/// Stateless beyond the policy, so one executor can serve any number of
/// concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct BackoffExecutor {
    policy: RetryPolicy,
}

impl BackoffExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<T, F, Fut>(&self, work: F) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        execute_with_retry(&self.policy, work).await
    }
}
