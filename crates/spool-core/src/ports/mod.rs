//! Ports - 外部との境界
//!
//! - `KeyValueStore`: タスクの永続化先
//! - `Clock`: 現在時刻（テストで差し替え可能）

pub mod clock;
pub mod kv_store;

pub use self::clock::{Clock, FixedClock, SystemClock, TokioClock};
pub use self::kv_store::KeyValueStore;
