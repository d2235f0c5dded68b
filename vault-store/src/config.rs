//! Store configuration: environment variable names, defaults, and path helpers.

use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    /// Root directory for filesystem-backed storage.
    pub const STORAGE_ROOT: &str = "VAULT_STORAGE_ROOT";
}

/// Default values
pub mod defaults {
    pub const STORAGE_ROOT: &str = "./data";
    /// Subdirectory holding whole-vault snapshot files.
    pub const VAULTS_DIR: &str = "vaults";
    /// Subdirectory holding preamble+body note files.
    pub const NOTES_DIR: &str = "notes";
    /// Identity substituted when a caller supplies none (single-tenant mode).
    pub const DEFAULT_USER: &str = "default";
    /// Words shorter than this are never indexed.
    pub const MIN_INDEX_WORD_LEN: usize = 3;
}

/// Resolve the filesystem storage root, honoring the env override.
pub fn storage_root() -> PathBuf {
    env::var(env_vars::STORAGE_ROOT)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(defaults::STORAGE_ROOT))
}

/// Storage path of a vault's snapshot file.
pub fn vault_snapshot_path(vault_id: &str) -> String {
    format!("{}/{}.json", defaults::VAULTS_DIR, vault_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_snapshot_path() {
        assert_eq!(
            vault_snapshot_path("vault-1700000000000-abc123"),
            "vaults/vault-1700000000000-abc123.json"
        );
    }
}
