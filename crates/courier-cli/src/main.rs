use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use courier_core::{QueueConfig, RequestKey, RequestQueue, Upstream, UpstreamError};

#[derive(Debug, Parser)]
#[command(name = "courier", about = "Drive a simulated quota-limited API through the request queue")]
struct Args {
    /// JSON queue config (see QueueConfig). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total requests to issue.
    #[arg(long, default_value_t = 12)]
    requests: usize,

    /// Number of distinct keys the requests cycle through.
    #[arg(long, default_value_t = 4)]
    keys: usize,

    /// Every Nth upstream call answers 429. 0 disables throttling.
    #[arg(long, default_value_t = 3)]
    fail_every: u32,

    /// Share one dispatch between concurrent requests for the same key.
    #[arg(long)]
    coalesce: bool,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    id: String,
    snippet: String,
}

/// Stand-in for a mailbox API that throttles every Nth call.
struct SimulatedMailbox {
    calls: AtomicU32,
    fail_every: u32,
}

#[async_trait]
impl Upstream for SimulatedMailbox {
    type Value = Message;

    async fn call(&self, key: &RequestKey) -> Result<Message, UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        sleep(Duration::from_millis(20)).await;

        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(UpstreamError::http(429, "User-rate limit exceeded"));
        }
        if key.as_str().starts_with("revoked") {
            return Err(UpstreamError::http(401, "invalid_grant"));
        }

        Ok(Message {
            id: key.to_string(),
            snippet: format!("message body for {key} (call {n})"),
        })
    }
}

fn load_config(args: &Args) -> anyhow::Result<QueueConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            QueueConfig::from_json_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => QueueConfig {
            min_interval_ms: 200,
            ..QueueConfig::default()
        },
    };
    if args.coalesce {
        config.coalesce_in_flight = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(?config, "starting");

    let upstream = Arc::new(SimulatedMailbox {
        calls: AtomicU32::new(0),
        fail_every: args.fail_every,
    });
    let queue = RequestQueue::new(Arc::clone(&upstream), config)?;

    let keys = args.keys.max(1);
    let mut handles = Vec::with_capacity(args.requests);
    for i in 0..args.requests {
        let queue = queue.clone();
        let key = format!("msg-{}", i % keys);
        handles.push(tokio::spawn(async move {
            let result = queue.enqueue_str(&key).await;
            (key, result)
        }));
    }

    let mut fetched = Vec::new();
    for handle in handles {
        let (key, result) = handle.await?;
        match result {
            Ok(msg) => {
                info!(%key, snippet = %msg.snippet, "ok");
                fetched.push(msg);
            }
            Err(e) => {
                let hint = e.kind().map(|k| k.user_message()).unwrap_or("unexpected error");
                warn!(%key, error = %e, hint, "failed");
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&fetched)?);

    let status = queue.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    println!("upstream calls: {}", upstream.calls.load(Ordering::Relaxed));

    Ok(())
}
