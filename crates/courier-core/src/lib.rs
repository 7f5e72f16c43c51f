//! courier-core
//!
//! Rate-limited, deduplicating request dispatch for quota-limited upstream APIs.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（RequestKey, UpstreamError, ErrorKind, ClassifiedError, CourierError）
//! - **ports**: 抽象化レイヤー（Upstream, Clock）
//! - **backoff**: RetryPolicy, classify, execute_with_retry
//! - **queue**: RequestQueue（間隔制御・キャッシュ・coalescing）

pub mod backoff;
pub mod domain;
pub mod ports;
pub mod queue;

pub use backoff::{BackoffExecutor, RetryPolicy, classify, execute_with_retry};
pub use domain::{ClassifiedError, CourierError, ErrorKind, RequestKey, UpstreamError};
pub use ports::{Clock, SystemClock, Upstream, upstream_fn};
pub use queue::{QueueConfig, QueueStatus, RequestQueue};
