//! PayloadCodec - Task と TaskEnvelope の相互変換
//!
//! # デシリアライズフロー
//! 1. envelope の task_type でデコーダを引く
//! 2. 見つからなければ `CodecError::UnknownTaskType`（登録漏れ＝デプロイの不具合）
//! 3. 見つかれば payload を具体型にデコードして `Box<dyn DynTask>` を返す

use std::sync::Arc;

use super::erased::DynTask;
use super::registry::TaskRegistry;
use crate::domain::{TaskEnvelope, TaskType};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No decoder registered for the tag. A task kind was removed or renamed
    /// without a migration, or startup registration is incomplete.
    #[error("no decoder registered for task type '{0}'")]
    UnknownTaskType(String),

    #[error("failed to encode task '{task_type}': {source}")]
    Encode {
        task_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode task '{task_type}': {source}")]
    Decode {
        task_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Wraps live tasks into envelopes and back, using a shared registry.
#[derive(Debug, Clone)]
pub struct PayloadCodec {
    registry: Arc<TaskRegistry>,
}

impl PayloadCodec {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Capture the task's type tag and serialized payload.
    pub fn wrap(&self, task: &dyn DynTask) -> Result<TaskEnvelope, CodecError> {
        let payload = task.to_payload().map_err(|source| CodecError::Encode {
            task_type: task.task_type().to_string(),
            source,
        })?;
        Ok(TaskEnvelope::new(TaskType::new(task.task_type()), payload))
    }

    /// Rebuild a live task from its envelope.
    pub fn unwrap(&self, envelope: TaskEnvelope) -> Result<Box<dyn DynTask>, CodecError> {
        let task_type = envelope.task_type().as_str().to_string();
        let decode = self
            .registry
            .get(&task_type)
            .ok_or_else(|| CodecError::UnknownTaskType(task_type.clone()))?;

        decode(envelope.into_payload()).map_err(|source| CodecError::Decode { task_type, source })
    }
}
