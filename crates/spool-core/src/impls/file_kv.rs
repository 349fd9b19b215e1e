//! FileKvStore - ディレクトリ上の key-value store
//!
//! 1 キー = 1 ファイル（`<root>/<key>.json`）。書き込みは `NamedTempFile` に書いてから
//! persist（rename）するので、途中でプロセスが落ちても古い値か新しい値のどちらかが残る。

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::StorageError;
use crate::ports::KeyValueStore;

#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // keys become file names: keep them to a safe charset
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // unique temp file in the same directory, so concurrent writers never share it
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let kv = FileKvStore::open(dir.path()).unwrap();
        kv.set("spool.tasks", r#"{"a":1}"#).unwrap();

        let reopened = FileKvStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("spool.tasks").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKvStore::open(dir.path()).unwrap();
        assert_eq!(kv.get("missing").unwrap(), None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKvStore::open(dir.path()).unwrap();

        for key in ["../escape", "a/b", "", ".hidden"] {
            let err = kv.set(key, "x").unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key={key:?}");
        }
    }

    #[test]
    fn concurrent_writers_on_one_key_never_fail() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKvStore::open(dir.path()).unwrap();

        let writers: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|name| {
                let kv = kv.clone();
                std::thread::spawn(move || {
                    for round in 0..100 {
                        kv.set("spool.tasks", &format!(r#"{{"{name}":{round}}}"#))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let blob = kv.get("spool.tasks").unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert!(v == serde_json::json!({"left": 99}) || v == serde_json::json!({"right": 99}));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKvStore::open(dir.path()).unwrap();

        kv.set("k", "one").unwrap();
        kv.set("k", "two").unwrap();

        assert_eq!(kv.get("k").unwrap().as_deref(), Some("two"));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }
}
