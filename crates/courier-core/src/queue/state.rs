//! Queue state: pending entries, drain flag, dispatch spacing, cache.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::QueueConfig;
use super::cache::TtlCache;
use super::entry::{QueueEntry, Settle};
use super::status::QueueStatus;
use crate::domain::{ClassifiedError, RequestKey};

/// Drain loop state.
///
/// State transitions:
/// - Idle -> Draining (only on enqueue, when nothing is draining)
/// - Draining -> Idle (only when `pending` becomes empty)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DrainState {
    Idle,
    Draining,
}

impl DrainState {
    pub fn is_draining(self) -> bool {
        matches!(self, DrainState::Draining)
    }
}

/// Everything the queue mutates. Guarded by one lock in the dispatcher; never
/// held across a sleep or an upstream call.
pub(crate) struct QueueState<V> {
    pending: VecDeque<QueueEntry<V>>,
    drain: DrainState,
    last_dispatch_at: Option<Instant>,
    last_dispatch_wall: Option<DateTime<Utc>>,
    cache: TtlCache<V>,

    /// Extra waiters for a key that is pending or in flight. Only populated
    /// when coalescing is on; a key is present from its first enqueue until
    /// its dispatch settles.
    followers: HashMap<RequestKey, Vec<Settle<V>>>,

    coalesce: bool,
    next_seq: u64,
    dispatched: u64,
    succeeded: u64,
    failed: u64,
}

impl<V: Clone> QueueState<V> {
    pub(crate) fn new(config: &QueueConfig) -> Self {
        Self {
            pending: VecDeque::new(),
            drain: DrainState::Idle,
            last_dispatch_at: None,
            last_dispatch_wall: None,
            cache: TtlCache::new(config.cache_ttl(), config.cache_capacity),
            followers: HashMap::new(),
            coalesce: config.coalesce_in_flight,
            next_seq: 1,
            dispatched: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    pub(crate) fn cached(&mut self, key: &RequestKey, now: Instant) -> Option<V> {
        self.cache.get(key, now)
    }

    /// Register a caller for `key`.
    ///
    /// Returns `true` when the caller must start the drain loop (the state
    /// moved Idle -> Draining).
    pub(crate) fn admit(
        &mut self,
        key: RequestKey,
        reply: Settle<V>,
        enqueued_at: DateTime<Utc>,
    ) -> bool {
        if self.coalesce {
            if let Some(waiters) = self.followers.get_mut(&key) {
                waiters.push(reply);
                return false;
            }
            self.followers.insert(key.clone(), Vec::new());
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending
            .push_back(QueueEntry::new(seq, key, enqueued_at, reply));

        if self.drain.is_draining() {
            false
        } else {
            self.drain = DrainState::Draining;
            true
        }
    }

    /// Spacing still owed before the next dispatch, or `None` (and back to
    /// Idle) if there is nothing left to dispatch.
    pub(crate) fn next_wait(&mut self, now: Instant, min_interval: Duration) -> Option<Duration> {
        if self.pending.is_empty() {
            self.drain = DrainState::Idle;
            return None;
        }
        let wait = match self.last_dispatch_at {
            Some(last) => min_interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        };
        Some(wait)
    }

    pub(crate) fn pop_front(&mut self) -> Option<QueueEntry<V>> {
        self.pending.pop_front()
    }

    /// Book-keep a finished dispatch and hand back coalesced waiters for `key`.
    pub(crate) fn record_dispatch(
        &mut self,
        key: &RequestKey,
        result: &Result<V, ClassifiedError>,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Vec<Settle<V>> {
        self.last_dispatch_at = Some(now);
        self.last_dispatch_wall = Some(wall);
        self.dispatched += 1;

        match result {
            Ok(value) => {
                self.succeeded += 1;
                self.cache.insert(key.clone(), value.clone(), now);
            }
            Err(_) => self.failed += 1,
        }

        self.followers.remove(key).unwrap_or_default()
    }

    pub(crate) fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub(crate) fn status(&self) -> QueueStatus {
        QueueStatus {
            queue_length: self.pending.len(),
            is_draining: self.drain.is_draining(),
            last_dispatch_at: self.last_dispatch_wall,
            cache_size: self.cache.len(),
            dispatched: self.dispatched,
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }
}
