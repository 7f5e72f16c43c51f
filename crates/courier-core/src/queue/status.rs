use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of a queue, for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Entries appended minus entries dispatched.
    pub queue_length: usize,
    pub is_draining: bool,
    /// Wall-clock time the last dispatch finished.
    pub last_dispatch_at: Option<DateTime<Utc>>,
    pub cache_size: usize,
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
}
