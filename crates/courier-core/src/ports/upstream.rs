//! Upstream port - 上流 API 呼び出しの抽象化
//!
//! queue は「1 回呼ぶ」関数だけを必要とします。認証情報や HTTP クライアントは
//! 呼び出し側が実装に閉じ込めます。

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{RequestKey, UpstreamError};

/// One call to the quota-limited upstream for a given key.
///
/// Implementations perform exactly one attempt; retrying is the executor's job.
#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    async fn call(&self, key: &RequestKey) -> Result<Self::Value, UpstreamError>;
}

#[async_trait]
impl<U: Upstream> Upstream for Arc<U> {
    type Value = U::Value;

    async fn call(&self, key: &RequestKey) -> Result<Self::Value, UpstreamError> {
        (**self).call(key).await
    }
}

/// Adapter turning an async closure into an [`Upstream`].
pub struct FnUpstream<F> {
    f: F,
}

/// Build an [`Upstream`] from `|key| async move { ... }`.
pub fn upstream_fn<F, Fut, T>(f: F) -> FnUpstream<F>
where
    F: Fn(RequestKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, UpstreamError>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    FnUpstream { f }
}

#[async_trait]
impl<F, Fut, T> Upstream for FnUpstream<F>
where
    F: Fn(RequestKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, UpstreamError>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    async fn call(&self, key: &RequestKey) -> Result<T, UpstreamError> {
        (self.f)(key.clone()).await
    }
}
