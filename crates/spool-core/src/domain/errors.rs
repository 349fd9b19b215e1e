//! Errors - エラー型と分類
//!
//! - `TaskError`: タスクの `execute` が返す失敗（キューはこれを「リトライ」と解釈する）
//! - `StorageError`: バックエンドの key-value store の失敗
//! - `SpoolError`: キュー API が返す包括エラー

use thiserror::Error;

use crate::typed::CodecError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a task's `execute`.
///
/// Any `TaskError` is treated as transient: the queue schedules a retry.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it reachable through `source()`.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for TaskError {
    fn from(e: std::io::Error) -> Self {
        Self::with_source(format!("io: {e}"), e)
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(e: serde_json::Error) -> Self {
        Self::with_source(format!("json: {e}"), e)
    }
}

/// Failure of the backing key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage backend: {0}")]
    Backend(String),
}

/// Errors returned by the queue and store APIs.
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
