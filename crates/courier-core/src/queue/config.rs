//! Queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::RetryPolicy;
use crate::domain::CourierError;

/// Per-queue settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Minimum spacing between the end of one dispatch and the start of the next.
    pub min_interval_ms: u64,

    /// How long a successful result is served from cache.
    pub cache_ttl_ms: u64,

    /// Maximum number of cached results. `0` disables caching.
    pub cache_capacity: usize,

    /// Share one dispatch between concurrent requests for the same key.
    pub coalesce_in_flight: bool,

    /// Backoff applied to each dispatch.
    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1_000,
            cache_ttl_ms: 5 * 60 * 1_000,
            cache_capacity: 500,
            coalesce_in_flight: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn from_json_str(s: &str) -> Result<Self, CourierError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| CourierError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CourierError> {
        if self.cache_ttl_ms == 0 {
            return Err(CourierError::InvalidConfig(
                "cache_ttl_ms must be greater than zero".to_string(),
            ));
        }
        self.retry.validate()
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = QueueConfig::from_json_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());
        assert_eq!(config.min_interval(), Duration::from_secs(1));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn nested_retry_policy_is_parsed() {
        let config = QueueConfig::from_json_str(
            r#"{
                "min_interval_ms": 250,
                "coalesce_in_flight": true,
                "retry": { "max_retries": 1, "jitter": false }
            }"#,
        )
        .unwrap();

        assert_eq!(config.min_interval_ms, 250);
        assert!(config.coalesce_in_flight);
        assert_eq!(config.retry.max_retries, 1);
        assert!(!config.retry.jitter);
        assert_eq!(config.retry.base_delay_ms, 1_000);
    }

    #[test]
    fn rejects_zero_ttl() {
        let err = QueueConfig::from_json_str(r#"{"cache_ttl_ms": 0}"#).unwrap_err();
        assert!(matches!(err, CourierError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_invalid_retry_policy() {
        let err = QueueConfig::from_json_str(r#"{"retry": {"base_delay_ms": 0}}"#).unwrap_err();
        assert!(matches!(err, CourierError::InvalidPolicy(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = QueueConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, CourierError::InvalidConfig(_)));
    }
}
