//! Content-addressed merge-base blobs
//!
//! A flat hash→bytes store. Any number of records may reference the
//! same key; blobs are immutable once written and eager garbage
//! collection is not required.

use std::path::{Path, PathBuf};

use vault_fs::checksum;

use crate::Result;

#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are canonical "sha256:<hex>"; the filename drops the
        // prefix so the directory stays shell-friendly.
        self.dir.join(key.trim_start_matches("sha256:"))
    }

    /// Store content, returning its canonical key. Idempotent.
    pub fn put(&self, content: &[u8]) -> Result<String> {
        let key = checksum::compute_content_checksum(content);
        let path = self.path_for(&key);
        if !path.exists() {
            vault_fs::io::write_atomic(&path, content)?;
        }
        Ok(key)
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(vault_fs::io::read_if_exists(&self.path_for(key))?)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
