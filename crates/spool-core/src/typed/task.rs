//! Task trait - 型付き Task の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const TYPE`)
//! - Trait bounds の組み合わせ (Clone + Serialize + DeserializeOwned + Send + Sync + 'static)
//! - デフォルト実装による「任意の能力」（`required_flags`）

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{TaskError, TaskMeta};

/// A unit of deferred, retryable work.
///
/// # 使用例
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct SendLog {
///     #[serde(flatten)]
///     meta: TaskMeta,
///     line: String,
/// }
///
/// #[async_trait]
/// impl Task for SendLog {
///     const TYPE: &'static str = "acme.analytics.send_log.v1";
///
///     fn meta(&self) -> &TaskMeta { &self.meta }
///     fn meta_mut(&mut self) -> &mut TaskMeta { &mut self.meta }
///
///     async fn execute(&self) -> Result<(), TaskError> {
///         upload(&self.line).await.map_err(TaskError::from)
///     }
/// }
/// ```
///
/// Tasks own their retry *budget* (`TaskMeta::max_retry_count`) but never the
/// backoff schedule; that lives in the queue so every kind backs off alike.
///
/// # Trait Bounds
/// - `Serialize` / `DeserializeOwned`: 永続化のため
/// - `Clone`: 実行中もキューの先頭にタスクを残したまま実行するため
/// - `Send + Sync + 'static`: バックグラウンドの tokio タスクで実行するため
#[async_trait]
pub trait Task: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Type tag used for decode dispatch.
    ///
    /// # 命名規約
    /// - `{namespace}.{domain}.{action}.v{major}`
    /// - 例: `acme.dictionary.sync.v1`
    ///
    /// Bump the major version when the payload shape changes incompatibly.
    const TYPE: &'static str;

    fn meta(&self) -> &TaskMeta;

    fn meta_mut(&mut self) -> &mut TaskMeta;

    /// Runtime flags that must all be `true` for this task to run.
    ///
    /// If any is unset the task is dropped without executing.
    fn required_flags(&self) -> &[String] {
        &[]
    }

    /// Perform the side effect. Any error schedules a retry.
    async fn execute(&self) -> Result<(), TaskError>;
}
