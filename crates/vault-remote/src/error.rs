//! Error types for vault-remote

use std::time::Duration;
use vault_fs::VaultPath;

/// Result type for vault-remote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the remote or maintaining its cache
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transient "too many requests" response. Callers retry after a
    /// wait; this never counts as a run failure unless cancelled.
    #[error("Remote throttled the request")]
    Throttled { retry_after: Option<Duration> },

    #[error("Remote path not found: {path}")]
    NotFound { path: VaultPath },

    #[error("Remote protocol error: {0}")]
    Protocol(String),

    #[error("Snapshot cache serialization failed: {0}")]
    Cache(#[source] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] vault_fs::Error),
}

impl Error {
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }
}
