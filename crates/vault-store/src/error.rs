//! Error types for vault-store

/// Result type for vault-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur persisting records or blobs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Record serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] vault_fs::Error),
}
