//! Task identifiers.
//!
//! `TaskId` は文字列の newtype です。ホストアプリが独自の ID（例: `"sync-dictionary"`）を
//! 付けて重複投入を防ぐこともできるし、`TaskId::generate()` で ULID を振ることもできます。
//!
//! ## ULID を使う理由
//! - **時刻でソート可能**: 再起動後に永続化されたタスクを読み戻すとき、生成順に並ぶ
//! - **調整不要**: どこで生成しても衝突しない

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

use crate::ports::{Clock, SystemClock};

/// Stable, unique identifier of a task instance.
///
/// Used for de-duplication on enqueue and as the key in the persisted blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh ULID-based id (`task-01J...`).
    pub fn generate() -> Self {
        Self::generate_with(&SystemClock)
    }

    /// Generate an id whose timestamp part comes from `clock`.
    ///
    /// With a `FixedClock` the timestamp part is deterministic; the random part is not.
    pub fn generate_with(clock: &dyn Clock) -> Self {
        let timestamp_ms = clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        Self(format!("task-{ulid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
