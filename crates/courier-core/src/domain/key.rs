use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::CourierError;

/// Identifies the logical resource being requested (a place ID, a vendor ID, ...).
///
/// Used both for dispatch bookkeeping and for cache lookups, so two keys that
/// compare equal always share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestKey(String);

impl RequestKey {
    /// Build a key, rejecting empty or whitespace-only input.
    pub fn new(s: impl Into<String>) -> Result<Self, CourierError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(CourierError::InvalidKey);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RequestKey {
    type Error = CourierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RequestKey {
    type Error = CourierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequestKey> for String {
    fn from(key: RequestKey) -> Self {
        key.0
    }
}
