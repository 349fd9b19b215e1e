//! QueueBuilder - キューの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 依存の注入（KeyValueStore, TaskRegistry, RuntimeFlags, Clock）

use std::sync::Arc;

use tracing::info;

use super::config::QueueConfig;
use crate::domain::SpoolError;
use crate::ports::{Clock, KeyValueStore, SystemClock};
use crate::queue::{Executor, RuntimeFlags, TaskQueue, TaskStore};
use crate::typed::{PayloadCodec, Task, TaskRegistry};

/// Builds a `TaskQueue` from a backing store plus registered task kinds.
///
/// # 使用例
/// ```ignore
/// let queue = QueueBuilder::new(FileKvStore::open(".spool")?)
///     .register::<SendLog>()
///     .register::<SyncDictionary>()
///     .expect_tasks(&[SendLog::TYPE, SyncDictionary::TYPE])
///     .build()?;
/// queue.resume();
/// ```
///
/// # Fail-fast 設計
/// - expect_tasks() で期待される task_type を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 永続化済みタスクのデコードもここで行う（登録漏れはここでエラーになる）
pub struct QueueBuilder {
    kv: Arc<dyn KeyValueStore>,
    registry: TaskRegistry,
    expected_tasks: Option<Vec<String>>,
    config: QueueConfig,
    flags: RuntimeFlags,
    clock: Arc<dyn Clock>,
}

/// BuildError はキュー構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task types: {0:?}. These tasks were expected but not registered.")]
    MissingTaskTypes(Vec<String>),

    #[error("failed to load persisted tasks: {0}")]
    Load(#[from] SpoolError),
}

impl QueueBuilder {
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self::with_store(Arc::new(kv))
    }

    pub fn with_store(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            registry: TaskRegistry::new(),
            expected_tasks: None,
            config: QueueConfig::default(),
            flags: RuntimeFlags::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Register the decoder for `T`.
    pub fn register<T: Task>(mut self) -> Self {
        self.registry.register::<T>();
        self
    }

    /// Use a prebuilt registry (replaces anything registered so far).
    pub fn registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 期待される task_type のリストを設定
    pub fn expect_tasks(mut self, task_types: &[&str]) -> Self {
        self.expected_tasks = Some(task_types.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a flag map with the host (defaults to a fresh, empty one).
    pub fn flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Validate registrations, load persisted tasks and assemble the queue.
    ///
    /// The queue does not start draining until `resume()` or `enqueue()`.
    pub fn build(self) -> Result<TaskQueue, BuildError> {
        if let Some(expected_tasks) = &self.expected_tasks {
            let missing_tasks: Vec<String> = expected_tasks
                .iter()
                .filter(|t| !self.registry.contains(t))
                .cloned()
                .collect();
            if !missing_tasks.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing_tasks));
            }
        }

        let codec = PayloadCodec::new(Arc::new(self.registry));
        let mut store = TaskStore::open(self.kv, self.config.storage_key.clone(), codec);
        let tasks = store.load(self.config.undecodable_tasks)?;
        info!(
            storage_key = %self.config.storage_key,
            restored = tasks.len(),
            "task queue ready"
        );

        Ok(TaskQueue::new(
            store,
            tasks,
            Executor::new(self.flags),
            self.config.retry,
            self.clock,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryKvStore;
    use crate::queue::UndecodableTaskPolicy;
    use crate::test_support::{GatedTask, ScriptedTask, registry};
    use crate::typed::CodecError;

    #[test]
    fn test_build_success() {
        let queue = QueueBuilder::new(InMemoryKvStore::new())
            .register::<ScriptedTask>()
            .expect_tasks(&[ScriptedTask::TYPE])
            .build();
        assert!(queue.is_ok());
    }

    #[test]
    fn test_build_missing_task_types() {
        let queue = QueueBuilder::new(InMemoryKvStore::new())
            .register::<ScriptedTask>()
            .expect_tasks(&[ScriptedTask::TYPE, GatedTask::TYPE])
            .build();
        assert!(matches!(
            queue,
            Err(BuildError::MissingTaskTypes(missing)) if missing == vec![GatedTask::TYPE.to_string()]
        ));
    }

    #[test]
    fn test_build_no_expect_tasks() {
        let queue = QueueBuilder::new(InMemoryKvStore::new())
            .register::<ScriptedTask>()
            .build();
        assert!(queue.is_ok());
    }

    #[tokio::test]
    async fn build_fails_on_persisted_task_of_unregistered_kind() {
        let kv = InMemoryKvStore::new();
        // a persisted task of a kind this build does not register
        kv.set(
            "spool.tasks",
            &serde_json::json!({
                "g": { "taskType": GatedTask::TYPE, "payload": { "id": "g", "journal": "x", "flags": [] } }
            })
            .to_string(),
        )
        .unwrap();

        let err = QueueBuilder::new(kv.clone())
            .register::<ScriptedTask>()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Load(SpoolError::Codec(CodecError::UnknownTaskType(_)))
        ));

        let queue = QueueBuilder::new(kv.clone())
            .register::<ScriptedTask>()
            .config(QueueConfig {
                undecodable_tasks: UndecodableTaskPolicy::Discard,
                ..QueueConfig::default()
            })
            .build()
            .unwrap();
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn custom_storage_key_is_used() {
        let kv = InMemoryKvStore::new();
        let queue = QueueBuilder::new(kv.clone())
            .registry(registry())
            .config(QueueConfig {
                storage_key: "custom.key".into(),
                ..QueueConfig::default()
            })
            .build()
            .unwrap();

        queue
            .enqueue(ScriptedTask::new("a", "builder-key").always_fail())
            .await
            .unwrap();

        assert!(kv.get("custom.key").unwrap().is_some());
        assert!(kv.get("spool.tasks").unwrap().is_none());
        queue.clear().await.unwrap();
    }
}
