//! QueueConfig - キューの設定
//!
//! すべてのフィールドにデフォルトがあるので、`{}` だけでも有効な設定になる。

use serde::{Deserialize, Serialize};

use crate::queue::{RetryPolicy, UndecodableTaskPolicy};

pub const DEFAULT_STORAGE_KEY: &str = "spool.tasks";

/// Queue configuration, loadable from JSON.
///
/// ```json
/// {
///   "storage_key": "spool.tasks",
///   "retry": { "base_delay_secs": 2, "multiplier": 2.0, "max_delay_secs": 300 },
///   "undecodable_tasks": "fail"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Key of the single blob holding every persisted task.
    pub storage_key: String,

    pub retry: RetryPolicy,

    pub undecodable_tasks: UndecodableTaskPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            retry: RetryPolicy::default(),
            undecodable_tasks: UndecodableTaskPolicy::Fail,
        }
    }
}

impl QueueConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
