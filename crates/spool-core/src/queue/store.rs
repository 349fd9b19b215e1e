//! TaskStore - キューの永続化ミラー
//!
//! 全タスクを `id → TaskEnvelope` の JSON オブジェクト 1 つにまとめ、
//! 1 つのストレージキーに保存する。変更のたびに全体を書き直す（O(タスク数)）が、
//! キューの深さは小さい前提なので問題にならない。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{SpoolError, StorageError, TaskEnvelope, TaskId};
use crate::ports::KeyValueStore;
use crate::typed::{DynTask, PayloadCodec};

/// What to do with a persisted entry that cannot be turned back into a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndecodableTaskPolicy {
    /// Refuse to load: the registry is incomplete or a payload shape changed.
    #[default]
    Fail,

    /// Log the entry, remove it from the store, and keep going.
    Discard,
}

/// Durable `id → envelope` map persisted as one blob.
pub struct TaskStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    codec: PayloadCodec,
    entries: BTreeMap<TaskId, TaskEnvelope>,
}

impl TaskStore {
    /// Load the blob under `key`.
    ///
    /// A missing, unreadable or corrupt blob yields an empty store.
    pub fn open(kv: Arc<dyn KeyValueStore>, key: impl Into<String>, codec: PayloadCodec) -> Self {
        let key = key.into();
        let entries = match kv.get(&key) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(storage_key = %key, error = %e, "corrupt task blob, starting empty");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(storage_key = %key, error = %e, "unreadable task blob, starting empty");
                BTreeMap::new()
            }
        };
        debug!(storage_key = %key, tasks = entries.len(), "task store opened");

        Self {
            kv,
            key,
            codec,
            entries,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert or overwrite the task under its id, then persist.
    pub fn add(&mut self, task: &dyn DynTask) -> Result<(), SpoolError> {
        let envelope = self.codec.wrap(task)?;
        let id = task.meta().id.clone();
        let previous = self.entries.insert(id.clone(), envelope);

        if let Err(e) = self.flush() {
            // keep memory and medium in agreement
            match previous {
                Some(envelope) => self.entries.insert(id, envelope),
                None => self.entries.remove(&id),
            };
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove the entry for `id`, then persist. Returns whether it existed.
    pub fn delete(&mut self, id: &TaskId) -> Result<bool, SpoolError> {
        let Some(previous) = self.entries.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.flush() {
            self.entries.insert(id.clone(), previous);
            return Err(e.into());
        }
        Ok(true)
    }

    /// Empty the map, then persist.
    pub fn clear(&mut self) -> Result<(), SpoolError> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(e) = self.flush() {
            self.entries = previous;
            return Err(e.into());
        }
        Ok(())
    }

    /// Decode every stored envelope, ordered by id.
    ///
    /// Fails on the first entry that cannot be decoded.
    pub fn load_all(&mut self) -> Result<Vec<Box<dyn DynTask>>, SpoolError> {
        self.load(UndecodableTaskPolicy::Fail)
    }

    /// Decode every stored envelope according to `policy`, ordered by id.
    ///
    /// An entry whose decoded id differs from its key is dropped from the
    /// store: keys must stay unique ids so `delete` can find them.
    pub fn load(&mut self, policy: UndecodableTaskPolicy) -> Result<Vec<Box<dyn DynTask>>, SpoolError> {
        let mut tasks = Vec::with_capacity(self.entries.len());
        let mut rejected = Vec::new();

        for (key, envelope) in &self.entries {
            let task = match self.codec.unwrap(envelope.clone()) {
                Ok(task) => task,
                Err(e) if policy == UndecodableTaskPolicy::Discard => {
                    warn!(task_id = %key, task_type = %envelope.task_type(), error = %e,
                        "discarding undecodable task");
                    rejected.push(key.clone());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if &task.meta().id != key {
                warn!(storage_id = %key, task_id = %task.meta().id,
                    "task id does not match its storage key, dropping entry");
                rejected.push(key.clone());
                continue;
            }
            tasks.push(task);
        }

        if !rejected.is_empty() {
            for key in &rejected {
                self.entries.remove(key);
            }
            self.flush()?;
        }
        Ok(tasks)
    }

    fn flush(&self) -> Result<(), StorageError> {
        let blob = serde_json::to_string(&self.entries)
            .map_err(|e| StorageError::Backend(format!("serialize task map: {e}")))?;
        self.kv.set(&self.key, &blob)
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("key", &self.key)
            .field("tasks", &self.entries.len())
            .finish()
    }
}
