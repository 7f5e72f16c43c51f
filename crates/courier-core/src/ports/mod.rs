//! Ports - 抽象化レイヤー
//!
//! 外部システム（上流 API、時刻）へのインターフェースを trait として定義し、
//! 実装の詳細を隠蔽します。テストでは差し替え可能です。

pub mod clock;
pub mod upstream;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::upstream::{FnUpstream, Upstream, upstream_fn};
