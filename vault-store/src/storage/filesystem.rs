//! Filesystem-backed storage provider rooted at a configurable directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{check_path, StorageProvider};
use crate::config;
use crate::errors::{StoreError, StoreResult};

pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rooted at the configured storage directory (env override or default).
    pub fn at_default_root() -> Self {
        Self::new(config::storage_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> StoreResult<PathBuf> {
        check_path(path)?;
        Ok(self.root.join(path))
    }
}

impl StorageProvider for FsStorage {
    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.full_path(path)?.is_file())
    }

    fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let full = self.full_path(path)?;
        match fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::not_found(path)),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(path, e))?;
        }
        fs::write(&full, bytes).map_err(|e| StoreError::io(path, e))
    }

    fn delete(&self, path: &str) -> StoreResult<()> {
        let full = self.full_path(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn list(&self, dir: &str) -> StoreResult<Vec<String>> {
        let full = if dir.is_empty() {
            self.root.clone()
        } else {
            self.full_path(dir.trim_end_matches('/'))?
        };
        if !full.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let entries = fs::read_dir(&full).map_err(|e| StoreError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            // Skip hidden files/dirs
            if name.starts_with('.') {
                continue;
            }
            let file_type = entry.file_type().map_err(|e| StoreError::io(dir, e))?;
            if file_type.is_dir() {
                names.push(format!("{name}/"));
            } else {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::walk_files;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.write("notes/skills/python.md", b"content").unwrap();
        assert!(dir.path().join("notes/skills/python.md").is_file());
        assert_eq!(storage.read("notes/skills/python.md").unwrap(), b"content");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(storage.read("ghost.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.write("a.md", b"x").unwrap();
        storage.delete("a.md").unwrap();
        storage.delete("a.md").unwrap();
        assert!(!storage.exists("a.md").unwrap());
    }

    #[test]
    fn test_list_skips_hidden_and_marks_dirs() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.write("notes/a.md", b"x").unwrap();
        storage.write("notes/skills/python.md", b"x").unwrap();
        std::fs::write(dir.path().join("notes/.index.lock"), b"x").unwrap();

        assert_eq!(storage.list("notes").unwrap(), vec!["a.md", "skills/"]);
        assert!(storage.list("missing").unwrap().is_empty());
    }

    #[test]
    fn test_walk_files_over_fs() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.write("vaults/v.json", b"{}").unwrap();
        storage.write("notes/deep/c.md", b"x").unwrap();

        let files = walk_files(&storage, "").unwrap();
        assert_eq!(files, vec!["notes/deep/c.md", "vaults/v.json"]);
    }
}
