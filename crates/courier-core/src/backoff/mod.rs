//! Backoff module: retry policy, error classification, and the retrying executor.

mod classify;
mod executor;
mod policy;

pub use classify::classify;
pub use executor::{BackoffExecutor, execute_with_retry};
pub use policy::{JITTER_SPAN_MS, RetryPolicy};
