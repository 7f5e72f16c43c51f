use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use courier_core::{
    CourierError, ErrorKind, QueueConfig, RequestKey, RequestQueue, RetryPolicy, UpstreamError,
    upstream_fn,
};

fn fast_config() -> QueueConfig {
    QueueConfig {
        min_interval_ms: 200,
        cache_ttl_ms: 30_000,
        cache_capacity: 8,
        coalesce_in_flight: false,
        retry: RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(2)).without_jitter(),
    }
}

#[tokio::test(start_paused = true)]
async fn gmail_like_upstream_end_to_end() {
    let calls = Arc::new(AtomicU32::new(0));
    let upstream = {
        let calls = Arc::clone(&calls);
        upstream_fn(move |key: RequestKey| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                match key.as_str() {
                    "expired-token" => Err(UpstreamError::http(401, "invalid_grant")),
                    "over-quota" => Err(UpstreamError::message(
                        "Quota exceeded for quota metric 'Queries per day'",
                    )),
                    // first call for anything else is throttled once
                    _ if n == 1 => Err(UpstreamError::http(429, "User-rate limit exceeded")
                        .with_retry_after(Duration::from_millis(500))),
                    other => Ok(format!("thread:{other}")),
                }
            }
        })
    };

    let queue = RequestQueue::new(upstream, fast_config()).unwrap();

    let ok = queue.enqueue_str("inbox-1").await.unwrap();
    assert_eq!(ok, "thread:inbox-1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let auth = queue.enqueue_str("expired-token").await.unwrap_err();
    assert_eq!(auth.kind(), Some(ErrorKind::AuthExpired));
    assert_eq!(
        ErrorKind::AuthExpired.user_message(),
        "Your connection has expired. Please sign in again."
    );

    let quota = queue.enqueue_str("over-quota").await.unwrap_err();
    assert_eq!(quota.kind(), Some(ErrorKind::QuotaExceeded));
    match quota {
        CourierError::Upstream(e) => assert_eq!(e.attempts, 1),
        other => panic!("unexpected error: {other}"),
    }

    // cached, no new call
    let before = calls.load(Ordering::SeqCst);
    assert_eq!(queue.enqueue_str("inbox-1").await.unwrap(), "thread:inbox-1");
    assert_eq!(calls.load(Ordering::SeqCst), before);

    let status = queue.status().await;
    assert_eq!(status.queue_length, 0);
    assert_eq!(status.dispatched, 3);
    assert_eq!(status.succeeded, 1);
    assert_eq!(status.failed, 2);
    assert_eq!(status.cache_size, 1);
    assert!(status.last_dispatch_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_are_isolated() {
    let upstream = upstream_fn(|key: RequestKey| async move {
        if key.as_str().starts_with("bad") {
            Err(UpstreamError::message("unexpected payload"))
        } else {
            Ok(key.as_str().len())
        }
    });
    let queue = RequestQueue::new(upstream, fast_config()).unwrap();

    let mut handles = Vec::new();
    for name in ["good-1", "bad-1", "good-22", "bad-2", "good-333"] {
        let q = queue.clone();
        handles.push(tokio::spawn(async move { (name, q.enqueue_str(name).await) }));
    }

    for h in handles {
        let (name, result) = h.await.unwrap();
        if name.starts_with("bad") {
            assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::Unknown));
        } else {
            assert_eq!(result.unwrap(), name.len());
        }
    }
}

#[test]
fn status_serializes_to_json() {
    let status = courier_core::QueueStatus {
        queue_length: 2,
        is_draining: true,
        ..Default::default()
    };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["queue_length"], 2);
    assert_eq!(json["is_draining"], true);
    assert!(json["last_dispatch_at"].is_null());
}
