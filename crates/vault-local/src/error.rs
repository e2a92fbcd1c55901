//! Error types for vault-local

use std::path::PathBuf;
use vault_fs::VaultPath;

/// Result type for vault-local operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in local adapter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Local path not found: {path}")]
    NotFound { path: VaultPath },

    #[error("Local root is not a directory: {path}")]
    InvalidRoot { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
