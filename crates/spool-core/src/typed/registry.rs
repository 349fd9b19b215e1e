//! TaskRegistry - task_type → デコード関数
//!
//! # 学習ポイント
//! - HashMap での型消去されたクロージャの管理
//! - Generic methods での登録と型安全性
//!
//! 永続化されたタスクを読み戻すには、その task_type のデコーダが登録済みである必要がある。
//! グローバル変数にはせず、`Arc<TaskRegistry>` としてストアとキューに渡す（テストで差し替え可能）。

use std::collections::HashMap;
use std::sync::Arc;

use super::erased::{DynTask, erase};
use super::task::Task;

/// Decode function: payload → live task.
pub type DecodeFn =
    Arc<dyn Fn(serde_json::Value) -> Result<Box<dyn DynTask>, serde_json::Error> + Send + Sync>;

/// Maps type tags to decode functions.
///
/// Built during startup (mutable), then shared read-only behind an `Arc`.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register the serde-based decoder for `T`.
    ///
    /// Idempotent: registering the same kind again replaces the decoder.
    /// Returns `true` if the tag was not registered before.
    pub fn register<T: Task>(&mut self) -> bool {
        self.register_decoder(T::TYPE, |payload| {
            let task: T = serde_json::from_value(payload)?;
            Ok(erase(task))
        })
    }

    /// Register a custom decoder under `task_type`.
    ///
    /// Useful for migrating an old payload shape into the current task kind.
    pub fn register_decoder<F>(&mut self, task_type: impl Into<String>, decode: F) -> bool
    where
        F: Fn(serde_json::Value) -> Result<Box<dyn DynTask>, serde_json::Error>
            + Send
            + Sync
            + 'static,
    {
        self.decoders
            .insert(task_type.into(), Arc::new(decode))
            .is_none()
    }

    pub fn get(&self, task_type: &str) -> Option<DecodeFn> {
        self.decoders.get(task_type).cloned()
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.decoders.contains_key(task_type)
    }

    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.decoders.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("registered_types", &self.registered_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{GatedTask, ScriptedTask};

    #[test]
    fn register_and_get() {
        let mut registry = TaskRegistry::new();
        assert!(registry.register::<ScriptedTask>());

        assert!(registry.get(ScriptedTask::TYPE).is_some());
        assert!(registry.get(GatedTask::TYPE).is_none());
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = TaskRegistry::new();
        assert!(registry.register::<ScriptedTask>());
        assert!(!registry.register::<ScriptedTask>());

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registered_types_are_sorted() {
        let mut registry = TaskRegistry::new();
        registry.register::<ScriptedTask>();
        registry.register::<GatedTask>();

        assert_eq!(
            registry.registered_types(),
            vec![GatedTask::TYPE.to_string(), ScriptedTask::TYPE.to_string()]
        );
    }

    #[test]
    fn decoder_produces_the_registered_kind() {
        let mut registry = TaskRegistry::new();
        registry.register::<ScriptedTask>();

        let payload = serde_json::to_value(ScriptedTask::new("a", "registry")).unwrap();
        let decode = registry.get(ScriptedTask::TYPE).unwrap();
        let task = decode(payload).unwrap();

        assert_eq!(task.task_type(), ScriptedTask::TYPE);
        assert!(task.downcast_ref::<ScriptedTask>().is_some());
    }

    #[test]
    fn custom_decoder_can_migrate_payloads() {
        let mut registry = TaskRegistry::new();
        registry.register_decoder("test.scripted.v0", |payload| {
            // v0 stored the id under "key"
            let id = payload["key"].as_str().unwrap_or_default().to_string();
            Ok(erase(ScriptedTask::new(&id, "migrated")))
        });

        let decode = registry.get("test.scripted.v0").unwrap();
        let task = decode(serde_json::json!({"key": "legacy"})).unwrap();
        assert_eq!(task.meta().id.as_str(), "legacy");
        assert_eq!(task.task_type(), ScriptedTask::TYPE);
    }
}
