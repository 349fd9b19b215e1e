//! TaskEnvelope - 永続化用の型消去された形
//!
//! 異なる種類のタスクを 1 つの JSON オブジェクトに混在させるため、
//! `(taskType, payload)` のペアに変換して保存します。

use serde::{Deserialize, Serialize};

use super::TaskType;

/// Type tag + the concrete task's own serialized form.
///
/// Persisted as `{ "taskType": "...", "payload": ... }`. The payload is opaque
/// to everything except the decoder registered for `task_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEnvelope {
    task_type: TaskType,
    payload: serde_json::Value,
}

impl TaskEnvelope {
    pub fn new(task_type: TaskType, payload: serde_json::Value) -> Self {
        Self { task_type, payload }
    }

    pub fn task_type(&self) -> &TaskType {
        &self.task_type
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn into_payload(self) -> serde_json::Value {
        self.payload
    }
}
