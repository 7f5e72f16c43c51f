//! Serial request queue.
//!
//! Callers enqueue by key from any task. One drain loop per queue dispatches
//! entries FIFO, keeps at least `min_interval` between dispatches, runs each
//! upstream call through the backoff executor, caches successes, and settles
//! each caller on its own channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::state::QueueState;
use super::{QueueConfig, QueueStatus};
use crate::backoff::execute_with_retry;
use crate::domain::{ClassifiedError, CourierError, ErrorKind, RequestKey, UpstreamError};
use crate::ports::{Clock, SystemClock, Upstream};

struct Inner<U: Upstream> {
    upstream: U,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState<U::Value>>,
}

/// Rate-limited, caching request queue for one upstream integration.
///
/// Cloning is cheap and every clone shares the same pending list, cache and
/// spacing. Build one per upstream and pass it to whoever needs it.
pub struct RequestQueue<U: Upstream> {
    inner: Arc<Inner<U>>,
}

impl<U: Upstream> Clone for RequestQueue<U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<U: Upstream> RequestQueue<U> {
    pub fn new(upstream: U, config: QueueConfig) -> Result<Self, CourierError> {
        Self::with_clock(upstream, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        upstream: U,
        config: QueueConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CourierError> {
        config.validate()?;
        let state = Mutex::new(QueueState::new(&config));
        Ok(Self {
            inner: Arc::new(Inner {
                upstream,
                config,
                clock,
                state,
            }),
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Request the value for `key`.
    ///
    /// A fresh cached value is returned at once. Otherwise the request joins
    /// the queue and this resolves once it has been dispatched.
    pub async fn enqueue(&self, key: RequestKey) -> Result<U::Value, CourierError> {
        let (tx, rx) = oneshot::channel();

        let start_drain = {
            let mut state = self.inner.state.lock().await;
            if let Some(value) = state.cached(&key, Instant::now()) {
                debug!(%key, "served from cache");
                return Ok(value);
            }
            state.admit(key.clone(), tx, self.inner.clock.now())
        };

        if start_drain {
            debug!(%key, "starting drain loop");
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }

        rx.await.map_err(|_| CourierError::QueueClosed)?
    }

    /// [`enqueue`](Self::enqueue) for a raw string key.
    pub async fn enqueue_str(&self, key: &str) -> Result<U::Value, CourierError> {
        self.enqueue(RequestKey::new(key)?).await
    }

    /// Like [`enqueue`](Self::enqueue) but gives up waiting after `timeout`.
    ///
    /// The dispatch itself is not cancelled; when it completes its result
    /// still lands in the cache for later callers.
    pub async fn enqueue_with_timeout(
        &self,
        key: RequestKey,
        timeout: Duration,
    ) -> Result<U::Value, CourierError> {
        tokio::time::timeout(timeout, self.enqueue(key))
            .await
            .map_err(|_| CourierError::TimedOut(timeout))?
    }

    /// Drop every cached value. Pending requests are unaffected.
    pub async fn clear_cache(&self) {
        self.inner.state.lock().await.clear_cache();
    }

    pub async fn status(&self) -> QueueStatus {
        self.inner.state.lock().await.status()
    }
}

/// Drain loop. Runs until `pending` is empty, then flips the queue back to Idle.
async fn drain<U: Upstream>(inner: Arc<Inner<U>>) {
    let min_interval = inner.config.min_interval();

    loop {
        let wait = {
            let mut state = inner.state.lock().await;
            match state.next_wait(Instant::now(), min_interval) {
                Some(wait) => wait,
                None => break,
            }
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        // only this loop pops, so the head is still there
        let Some(entry) = inner.state.lock().await.pop_front() else {
            continue;
        };

        let result = dispatch(&inner, &entry.key).await;

        let finished_at = inner.clock.now();
        let followers = {
            let mut state = inner.state.lock().await;
            state.record_dispatch(&entry.key, &result, Instant::now(), finished_at)
        };

        let queued_ms = (finished_at - entry.enqueued_at).num_milliseconds();
        match &result {
            Ok(_) => debug!(key = %entry.key, seq = entry.seq, queued_ms, "dispatched"),
            Err(e) => info!(
                key = %entry.key,
                seq = entry.seq,
                queued_ms,
                kind = %e.kind,
                attempts = e.attempts,
                "dispatch failed"
            ),
        }

        let result = result.map_err(CourierError::from);
        for follower in followers {
            let _ = follower.send(result.clone());
        }
        let seq = entry.seq;
        if !entry.settle(result) {
            debug!(seq, "caller stopped waiting; result kept for cache only");
        }
    }

    debug!("drain loop idle");
}

/// One upstream dispatch with retry, on its own task so a panicking
/// upstream fails only this entry and the drain loop keeps going.
async fn dispatch<U: Upstream>(
    inner: &Arc<Inner<U>>,
    key: &RequestKey,
) -> Result<U::Value, ClassifiedError> {
    let call = {
        let inner = Arc::clone(inner);
        let key = key.clone();
        tokio::spawn(async move {
            let upstream = &inner.upstream;
            let key = &key;
            execute_with_retry(&inner.config.retry, move || upstream.call(key)).await
        })
    };

    match call.await {
        Ok(result) => result,
        Err(e) => {
            error!(%key, error = %e, "upstream call aborted");
            Err(ClassifiedError::new(
                ErrorKind::Unknown,
                UpstreamError::message(format!("upstream call aborted: {e}")),
            ))
        }
    }
}
