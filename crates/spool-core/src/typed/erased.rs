//! DynTask - Task の型消去
//!
//! # 学習ポイント
//! - `Task` は `const TYPE` と `Serialize` を持つので object-safe ではない
//! - `DynTask` は object-safe な抽象化で、`VecDeque<Box<dyn DynTask>>` に格納できる
//! - Type erasure パターン (`TypedTask<T>` → `dyn DynTask`)
//!
//! `TypedTask<T>` でラップしてから実装するので、`Task` と `DynTask` のメソッド名が
//! 衝突しない（具体型 `T` は `DynTask` を実装しない）。

use std::any::Any;

use async_trait::async_trait;

use super::task::Task;
use crate::domain::{TaskError, TaskMeta};

/// Object-safe view of a live task.
#[async_trait]
pub trait DynTask: Send + Sync {
    fn task_type(&self) -> &'static str;

    fn meta(&self) -> &TaskMeta;

    fn meta_mut(&mut self) -> &mut TaskMeta;

    fn required_flags(&self) -> &[String];

    /// Serialize the concrete task (the envelope payload).
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    fn clone_box(&self) -> Box<dyn DynTask>;

    fn as_any(&self) -> &dyn Any;

    async fn execute(&self) -> Result<(), TaskError>;
}

impl dyn DynTask {
    /// Borrow the concrete task back out, if it is a `T`.
    pub fn downcast_ref<T: Task>(&self) -> Option<&T> {
        self.as_any()
            .downcast_ref::<TypedTask<T>>()
            .map(|typed| &typed.0)
    }
}

impl Clone for Box<dyn DynTask> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn DynTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynTask")
            .field("task_type", &self.task_type())
            .field("meta", self.meta())
            .finish()
    }
}

/// Adapter from a concrete `T: Task` to `dyn DynTask`.
#[derive(Clone)]
pub struct TypedTask<T: Task>(T);

impl<T: Task> TypedTask<T> {
    pub fn new(task: T) -> Self {
        Self(task)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[async_trait]
impl<T: Task> DynTask for TypedTask<T> {
    fn task_type(&self) -> &'static str {
        T::TYPE
    }

    fn meta(&self) -> &TaskMeta {
        self.0.meta()
    }

    fn meta_mut(&mut self) -> &mut TaskMeta {
        self.0.meta_mut()
    }

    fn required_flags(&self) -> &[String] {
        self.0.required_flags()
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.0)
    }

    fn clone_box(&self) -> Box<dyn DynTask> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn execute(&self) -> Result<(), TaskError> {
        self.0.execute().await
    }
}

/// Box a concrete task as `dyn DynTask`.
pub fn erase<T: Task>(task: T) -> Box<dyn DynTask> {
    Box::new(TypedTask::new(task))
}
