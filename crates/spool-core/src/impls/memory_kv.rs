//! InMemoryKvStore - テスト・開発用の key-value store
//!
//! `Clone` すると同じ中身を共有するハンドルになる。これを使って
//! 「同じ永続化媒体から新しいキューを作り直す」＝プロセス再起動をテストで再現できる。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::StorageError;
use crate::ports::KeyValueStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_key_is_none() {
        let kv = InMemoryKvStore::new();
        assert_eq!(kv.get("nope").unwrap(), None);
    }

    #[test]
    fn clones_share_contents() {
        let kv = InMemoryKvStore::new();
        let other = kv.clone();

        kv.set("k", "v1").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v1"));

        other.set("k", "v2").unwrap();
        assert_eq!(kv.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(kv.len(), 1);
    }
}
