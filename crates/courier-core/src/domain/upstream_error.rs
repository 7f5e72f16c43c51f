//! Upstream error shape.
//!
//! SDKs surface failures differently: some carry an HTTP status, some a
//! numeric `code`, some only message text. `UpstreamError` keeps all three so
//! the classifier can prefer the structured signal and fall back to the text.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// One failed attempt against the upstream API, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub code: Option<u16>,
    pub message: String,
    /// Server-provided delay (from a `Retry-After` header or similar).
    pub retry_after: Option<Duration>,
}

impl UpstreamError {
    /// An error with an HTTP status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// An error with message text only (network failures, wrapped SDK errors).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// Attach a raw `Retry-After` header value. Unparseable values are ignored.
    pub fn with_retry_after_header(mut self, value: &str, now: DateTime<Utc>) -> Self {
        if let Some(delay) = parse_retry_after(value, now) {
            self.retry_after = Some(delay);
        }
        self
    }

    /// `status`, falling back to `code`.
    pub fn effective_status(&self) -> Option<u16> {
        self.status.or(self.code)
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective_status() {
            Some(status) => write!(f, "upstream error (status {status}): {}", self.message),
            None => write!(f, "upstream error: {}", self.message),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Parse a `Retry-After` header value.
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). A date in the past yields zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let delta = at.signed_duration_since(now);
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn effective_status_falls_back_to_code() {
        let err = UpstreamError::message("Rate Limit Exceeded").with_code(429);
        assert_eq!(err.effective_status(), Some(429));

        let err = UpstreamError::http(401, "nope").with_code(500);
        assert_eq!(err.effective_status(), Some(401));
    }

    #[test]
    fn retry_after_delta_seconds() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("120", now), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 3 ", now), Some(Duration::from_secs(3)));
    }

    #[test]
    fn retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 30).unwrap();
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn retry_after_in_the_past_is_zero() {
        let now = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn garbage_header_is_ignored() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("soon", now), None);

        let err = UpstreamError::http(429, "slow down").with_retry_after_header("soon", now);
        assert_eq!(err.retry_after, None);
    }

    #[test]
    fn display_includes_status() {
        let err = UpstreamError::http(503, "backend unavailable");
        assert_eq!(err.to_string(), "upstream error (status 503): backend unavailable");
        assert_eq!(
            UpstreamError::message("fetch failed").to_string(),
            "upstream error: fetch failed"
        );
    }
}
