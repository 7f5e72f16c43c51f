//! Errors - エラー型と分類
//!
//! - `ErrorKind`: 上流 API の失敗の運用分類（リトライ可否の判断材料）
//! - `ClassifiedError`: 分類済みの失敗（元のエラーを保持）
//! - `CourierError`: crate の公開エラー型

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::upstream_error::UpstreamError;

/// Operational classification of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Short-burst throttling. Retry locally.
    RateLimited,
    /// Credentials rejected. The caller must re-authenticate.
    AuthExpired,
    /// Daily (or longer) quota exhausted. Stop for this session.
    QuotaExceeded,
    /// Network blip or server-side hiccup. Retry locally.
    Transient,
    /// Anything else. Not retried.
    Unknown,
}

impl ErrorKind {
    /// Whether the backoff executor recovers this kind locally.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Transient)
    }

    /// Text for the application boundary to show a user.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::AuthExpired => "Your connection has expired. Please sign in again.",
            ErrorKind::QuotaExceeded => "Daily limit reached. Please try again tomorrow.",
            ErrorKind::RateLimited | ErrorKind::Transient => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::AuthExpired => "auth_expired",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::Transient => "transient",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upstream failure after classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} after {attempts} attempt(s): {raw}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub retry_after: Option<Duration>,
    pub raw: UpstreamError,
    /// How many times the work was invoked before this error surfaced.
    pub attempts: u32,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, raw: UpstreamError) -> Self {
        Self {
            kind,
            retry_after: raw.retry_after,
            raw,
            attempts: 1,
        }
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourierError {
    #[error("request key must not be empty")]
    InvalidKey,

    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid queue config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Upstream(#[from] ClassifiedError),

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("queue dropped the request before settling it")]
    QueueClosed,
}

impl CourierError {
    /// The classification of an upstream failure, if this is one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CourierError::Upstream(e) => Some(e.kind),
            _ => None,
        }
    }
}
