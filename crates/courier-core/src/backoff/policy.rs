//! Retry policy: decides backoff delays.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::CourierError;

/// Upper bound (exclusive) of the random delay added when jitter is on.
pub const JITTER_SPAN_MS: u64 = 1_000;

/// Retry policy for one outbound call.
///
/// Constructed per call site (or defaulted) and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` means a single attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay_ms: u64,

    /// Ceiling for any single delay, retry-after and jitter included.
    pub max_delay_ms: u64,

    /// Add a random `[0, 1000)` ms to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
            jitter: true,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn validate(&self) -> Result<(), CourierError> {
        if self.base_delay_ms == 0 {
            return Err(CourierError::InvalidPolicy(
                "base_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(CourierError::InvalidPolicy(format!(
                "max_delay_ms ({}) must be >= base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }

    /// Exponential delay for the given retry (1-indexed), capped at `max_delay`.
    ///
    /// Example with base=1s, max=30s:
    /// - attempt 1: 1s
    /// - attempt 2: 2s
    /// - attempt 3: 4s
    /// - attempt 6: 30s (32s capped)
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let ms = 2u64
            .checked_pow(exp)
            .map(|factor| self.base_delay_ms.saturating_mul(factor))
            .unwrap_or(u64::MAX);
        Duration::from_millis(ms.min(self.max_delay_ms))
    }

    /// Delay before the given retry with an explicit jitter amount.
    ///
    /// A server-provided `retry_after` replaces the exponential value. Jitter
    /// is added before the cap.
    pub fn delay_with_jitter(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        jitter_ms: u64,
    ) -> Duration {
        let chosen = retry_after.unwrap_or_else(|| self.exponential_delay(attempt));
        let total = chosen.saturating_add(Duration::from_millis(jitter_ms));
        total.min(self.max_delay())
    }

    /// Delay before the given retry, drawing jitter when enabled.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let jitter_ms = if self.jitter {
            rand::thread_rng().gen_range(0..JITTER_SPAN_MS)
        } else {
            0
        };
        self.delay_with_jitter(attempt, retry_after, jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay(), Duration::from_secs(1));
        assert_eq!(policy.max_delay(), Duration::from_secs(30));
        assert!(policy.jitter);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn exponential_backoff_doubles_until_cap() {
        let policy = RetryPolicy::default().without_jitter();

        let delays: Vec<u64> = (1..=7)
            .map(|attempt| policy.delay_for(attempt, None).as_millis() as u64)
            .collect();

        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 16_000, 30_000, 30_000]);
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.exponential_delay(200), Duration::from_secs(30));
        assert_eq!(policy.exponential_delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn retry_after_takes_precedence() {
        let policy = RetryPolicy::default().without_jitter();
        let delay = policy.delay_for(1, Some(Duration::from_secs(5)));
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn retry_after_is_capped() {
        let policy = RetryPolicy::default().without_jitter();
        let delay = policy.delay_for(1, Some(Duration::from_secs(120)));
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn jitter_is_added_before_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_with_jitter(1, None, 250),
            Duration::from_millis(1_250)
        );
        assert_eq!(
            policy.delay_with_jitter(6, None, 999),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn random_jitter_stays_in_range() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let delay = policy.delay_for(2, None);
            assert!(delay >= Duration::from_millis(2_000));
            assert!(delay < Duration::from_millis(3_000));
        }
    }

    #[test]
    fn validate_rejects_bad_bounds() {
        let zero_base = RetryPolicy {
            base_delay_ms: 0,
            ..RetryPolicy::default()
        };
        assert!(matches!(zero_base.validate(), Err(CourierError::InvalidPolicy(_))));

        let inverted = RetryPolicy {
            base_delay_ms: 5_000,
            max_delay_ms: 1_000,
            ..RetryPolicy::default()
        };
        assert!(matches!(inverted.validate(), Err(CourierError::InvalidPolicy(_))));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_retries": 5}"#).unwrap();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay_ms, 1_000);
        assert!(policy.jitter);
    }
}
