//! Error types for vault-tree

use vault_fs::VaultPath;

/// Result type for vault-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when querying or mutating a virtual tree
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Path not found: {path}")]
    NotFound { path: VaultPath },

    #[error("Not a directory: {path}")]
    NotADirectory { path: VaultPath },

    #[error("Directory not empty: {path}")]
    NotEmpty { path: VaultPath },

    #[error("Is a directory: {path}")]
    IsADirectory { path: VaultPath },
}
