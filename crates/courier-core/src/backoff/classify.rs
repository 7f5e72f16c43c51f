//! Error classification.
//!
//! Structured status first, message text second. Status codes are stable
//! across SDK versions; message wording is not, so text is only consulted when
//! the status is absent or says nothing specific.

use crate::domain::{ClassifiedError, ErrorKind, UpstreamError};

const DAILY_MARKERS: &[&str] = &["daily", "per day", "tomorrow"];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "quota exceeded",
    "user-rate limit",
    "daily limit",
    "too many requests",
];

const AUTH_MARKERS: &[&str] = &["invalid_grant", "invalid_token", "unauthorized", "forbidden"];

const TRANSIENT_MARKERS: &[&str] = &["network", "fetch", "timed out", "connection reset"];

/// Classify one upstream failure. Pure: depends only on `error`.
pub fn classify(error: &UpstreamError) -> ClassifiedError {
    ClassifiedError::new(classify_kind(error), error.clone())
}

fn classify_kind(error: &UpstreamError) -> ErrorKind {
    match error.effective_status() {
        Some(429) => return ErrorKind::RateLimited,
        Some(401 | 403) => return ErrorKind::AuthExpired,
        Some(408 | 500 | 502 | 503 | 504) => return ErrorKind::Transient,
        _ => {}
    }

    let message = error.message.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

    if message.contains("quota exceeded") && has(DAILY_MARKERS) {
        ErrorKind::QuotaExceeded
    } else if has(RATE_LIMIT_MARKERS) {
        ErrorKind::RateLimited
    } else if has(AUTH_MARKERS) {
        ErrorKind::AuthExpired
    } else if has(TRANSIENT_MARKERS) {
        ErrorKind::Transient
    } else {
        ErrorKind::Unknown
    }
}
