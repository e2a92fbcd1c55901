//! Error types for vault-engine

use vault_fs::VaultPath;

/// Result type for vault-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while planning or executing a sync run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Local(#[from] vault_local::Error),

    #[error(transparent)]
    Remote(#[from] vault_remote::Error),

    #[error(transparent)]
    Store(#[from] vault_store::Error),

    #[error(transparent)]
    Fs(#[from] vault_fs::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[source] toml::de::Error),

    #[error("Unresolved merge conflict at {path}")]
    MergeConflict { path: VaultPath },

    #[error("Content at {path} is not mergeable: {reason}")]
    NotMergeable { path: VaultPath, reason: String },

    #[error("Filename cannot exist remotely at {path}: {reason}")]
    InvalidFilename { path: VaultPath, reason: String },

    #[error("Remote base directory unusable: {0}")]
    RemoteBase(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// True when the failure came from remote rate limiting and the same
    /// operation should be retried after a wait.
    pub fn is_throttled(&self) -> bool {
        matches!(self, Error::Remote(e) if e.is_throttled())
    }

    /// Server-suggested wait before retrying, when throttled with one.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Error::Remote(vault_remote::Error::Throttled { retry_after }) => *retry_after,
            _ => None,
        }
    }
}
