//! Runtime flags consulted by the executor before running a task.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Process-wide `name → bool` map, set by the host.
///
/// In-memory only: every flag reads as `false` after a restart.
/// Cloning yields a handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct RuntimeFlags {
    flags: Arc<RwLock<HashMap<String, bool>>>,
}

impl RuntimeFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(&self, key: impl Into<String>, value: bool) {
        self.flags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// Unset flags read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    /// First flag in `keys` that is not `true`, if any.
    pub fn first_missing<'a>(&self, keys: &'a [String]) -> Option<&'a str> {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        keys.iter()
            .find(|key| !flags.get(key.as_str()).copied().unwrap_or(false))
            .map(String::as_str)
    }
}
