//! spool-core
//!
//! Durable, retrying background task queue.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task meta, envelope, outcome, errors）
//! - **ports**: 抽象化レイヤー（KeyValueStore, Clock）
//! - **impls**: 実装（InMemoryKvStore, FileKvStore）
//! - **typed**: 型付き Task API（Task trait, DynTask, TaskRegistry, PayloadCodec）
//! - **queue**: 永続化、実行、リトライ、ドレインループ（TaskQueue）
//! - **app**: 構築と設定（QueueBuilder, QueueConfig）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod typed;

#[cfg(test)]
mod test_support;

pub use app::{BuildError, QueueBuilder, QueueConfig};
pub use domain::{Outcome, SpoolError, TaskError, TaskId, TaskMeta};
pub use queue::{QueueStatus, RetryPolicy, RuntimeFlags, TaskQueue};
pub use typed::Task;
