//! Domain model (keys, upstream errors, classification).

pub mod errors;
pub mod key;
pub mod upstream_error;

pub use self::errors::{ClassifiedError, CourierError, ErrorKind};
pub use self::key::RequestKey;
pub use self::upstream_error::{UpstreamError, parse_retry_after};
