//! Queue entry: one caller's request waiting for dispatch.

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::domain::{CourierError, RequestKey};

pub(crate) type Settle<V> = oneshot::Sender<Result<V, CourierError>>;

/// Created on enqueue, removed from `pending` exactly once when dispatched.
/// Retries happen inside the dispatch; an entry is never put back.
#[derive(Debug)]
pub(crate) struct QueueEntry<V> {
    pub seq: u64,
    pub key: RequestKey,
    pub enqueued_at: DateTime<Utc>,
    pub(crate) reply: Settle<V>,
}

impl<V> QueueEntry<V> {
    pub(crate) fn new(
        seq: u64,
        key: RequestKey,
        enqueued_at: DateTime<Utc>,
        reply: Settle<V>,
    ) -> Self {
        Self {
            seq,
            key,
            enqueued_at,
            reply,
        }
    }

    /// Deliver the result. Returns `false` if the caller stopped waiting.
    pub(crate) fn settle(self, result: Result<V, CourierError>) -> bool {
        self.reply.send(result).is_ok()
    }
}
