//! KeyValueStore port - 永続化バックエンドの抽象化
//!
//! キューが必要とするのは「文字列キー → 文字列値」の get/set だけ。
//! 実装は `impls` にある（InMemoryKvStore, FileKvStore）。

use crate::domain::StorageError;

/// A string-keyed, string-valued durable store.
///
/// Calls are synchronous from the caller's point of view: once `set` returns
/// `Ok`, the value must survive a process restart (for durable backends).
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
