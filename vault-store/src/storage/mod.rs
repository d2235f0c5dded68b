//! Key-addressed byte storage.
//!
//! Paths are forward-slash relative strings under a single root. Operations
//! are synchronous and may block on I/O; not-found is distinguishable from
//! every other failure.

pub mod filesystem;
pub mod memory;

pub use filesystem::FsStorage;
pub use memory::MemoryStorage;

use crate::errors::{StoreError, StoreResult};

pub trait StorageProvider: Send + Sync {
    fn exists(&self, path: &str) -> StoreResult<bool>;

    fn read(&self, path: &str) -> StoreResult<Vec<u8>>;

    fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Idempotent: deleting an absent path is not an error.
    fn delete(&self, path: &str) -> StoreResult<()>;

    /// Non-recursive listing of a directory, sorted. Subdirectory entries
    /// carry a trailing '/' so callers can recurse explicitly.
    fn list(&self, dir: &str) -> StoreResult<Vec<String>>;
}

/// Reject paths that could escape the storage root.
pub(crate) fn check_path(path: &str) -> StoreResult<()> {
    if path.is_empty() {
        return Err(StoreError::invalid("empty storage path"));
    }
    if path.starts_with('/') {
        return Err(StoreError::invalid(format!("absolute path '{path}'")));
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return Err(StoreError::invalid(format!("malformed path '{path}'")));
    }
    Ok(())
}

/// Join a directory and an entry name into a storage path.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Recursively enumerate every file path under `dir` via the provider's
/// non-recursive `list`.
pub fn walk_files(provider: &dyn StorageProvider, dir: &str) -> StoreResult<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_string()];
    while let Some(current) = pending.pop() {
        for entry in provider.list(&current)? {
            if let Some(sub) = entry.strip_suffix('/') {
                pending.push(join_path(&current, sub));
            } else {
                files.push(join_path(&current, &entry));
            }
        }
    }
    files.sort();
    Ok(files)
}
