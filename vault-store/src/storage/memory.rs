//! In-memory storage provider for tests and single-session use.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use super::{check_path, StorageProvider};
use crate::errors::{StoreError, StoreResult};

/// Map-backed provider. Keys are full storage paths; directories exist only
/// implicitly as key prefixes.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageProvider for MemoryStorage {
    fn exists(&self, path: &str) -> StoreResult<bool> {
        check_path(path)?;
        Ok(self.entries.read().contains_key(path))
    }

    fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        check_path(path)?;
        self.entries
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(path))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        check_path(path)?;
        self.entries.write().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> StoreResult<()> {
        check_path(path)?;
        self.entries.write().remove(path);
        Ok(())
    }

    fn list(&self, dir: &str) -> StoreResult<Vec<String>> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            check_path(dir.trim_end_matches('/'))?;
            format!("{}/", dir.trim_end_matches('/'))
        };

        let mut names = BTreeSet::new();
        for key in self.entries.read().keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((first, _)) => names.insert(format!("{first}/")),
                None => names.insert(rest.to_string()),
            };
        }
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let storage = MemoryStorage::new();
        storage.write("notes/a.md", b"hello").unwrap();
        assert!(storage.exists("notes/a.md").unwrap());
        assert_eq!(storage.read("notes/a.md").unwrap(), b"hello");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.read("ghost.md").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.write("a.md", b"x").unwrap();
        storage.delete("a.md").unwrap();
        storage.delete("a.md").unwrap();
        assert!(!storage.exists("a.md").unwrap());
    }

    #[test]
    fn test_list_marks_directories() {
        let storage = MemoryStorage::new();
        storage.write("notes/a.md", b"x").unwrap();
        storage.write("notes/skills/python.md", b"x").unwrap();
        storage.write("vaults/v.json", b"x").unwrap();

        assert_eq!(storage.list("").unwrap(), vec!["notes/", "vaults/"]);
        assert_eq!(storage.list("notes").unwrap(), vec!["a.md", "skills/"]);
        assert_eq!(storage.list("notes/skills").unwrap(), vec!["python.md"]);
        assert!(storage.list("missing").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_traversal() {
        let storage = MemoryStorage::new();
        assert!(storage.write("../escape", b"x").is_err());
        assert!(storage.read("/abs").is_err());
    }
}
