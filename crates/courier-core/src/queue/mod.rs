//! Queue module: serial request queue with spacing, caching and optional coalescing.

mod cache;
mod config;
mod dispatcher;
mod entry;
mod state;
mod status;

pub use cache::TtlCache;
pub use config::QueueConfig;
pub use dispatcher::RequestQueue;
pub use status::QueueStatus;
