//! On-disk local adapter rooted at a directory

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use vault_fs::VaultPath;
use vault_tree::Entry;

use crate::{Error, Listing, LocalAdapter, Result};

/// [`LocalAdapter`] over a real directory tree, using tokio's fs.
///
/// Vault paths are resolved strictly under the canonicalized root;
/// normalization in [`VaultPath`] already prevents traversal above it.
#[derive(Debug, Clone)]
pub struct LocalDirAdapter {
    root: PathBuf,
}

impl LocalDirAdapter {
    /// Open an adapter over `root`, which must be an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = dunce::canonicalize(root.as_ref())
            .map_err(|e| Error::io(root.as_ref(), e))?;
        if !root.is_dir() {
            return Err(Error::InvalidRoot { path: root });
        }
        Ok(Self { root })
    }

    fn to_native(&self, path: &VaultPath) -> PathBuf {
        let mut native = self.root.clone();
        for segment in path.segments() {
            native.push(segment);
        }
        native
    }

    fn entry_from_metadata(
        &self,
        path: &VaultPath,
        meta: &std::fs::Metadata,
    ) -> Entry {
        if meta.is_dir() {
            Entry::dir(path.clone())
        } else {
            Entry::file(
                path.clone(),
                meta.modified().map(system_time_ms).unwrap_or_default(),
                meta.len(),
            )
        }
    }
}

#[async_trait]
impl LocalAdapter for LocalDirAdapter {
    async fn list(&self, dir: &VaultPath) -> Result<Listing> {
        let native = self.to_native(dir);
        let mut reader = tokio::fs::read_dir(&native)
            .await
            .map_err(|e| Error::io(&native, e))?;
        let mut listing = Listing::default();
        while let Some(item) = reader
            .next_entry()
            .await
            .map_err(|e| Error::io(&native, e))?
        {
            let name = item.file_name().to_string_lossy().to_string();
            let child = dir.join(&name);
            let meta = item.metadata().await.map_err(|e| Error::io(&native, e))?;
            let entry = self.entry_from_metadata(&child, &meta);
            if entry.is_dir {
                listing.folders.push(entry);
            } else {
                listing.files.push(entry);
            }
        }
        Ok(listing)
    }

    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>> {
        let native = self.to_native(path);
        match tokio::fs::metadata(&native).await {
            Ok(meta) => Ok(Some(self.entry_from_metadata(path, &meta))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&native, e)),
        }
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        let native = self.to_native(path);
        match tokio::fs::read(&native).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound { path: path.clone() })
            }
            Err(e) => Err(Error::io(&native, e)),
        }
    }

    async fn write(&self, path: &VaultPath, bytes: &[u8]) -> Result<()> {
        let native = self.to_native(path);
        if let Some(parent) = native.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }
        tokio::fs::write(&native, bytes)
            .await
            .map_err(|e| Error::io(&native, e))
    }

    async fn create_folder(&self, path: &VaultPath) -> Result<()> {
        let native = self.to_native(path);
        tokio::fs::create_dir_all(&native)
            .await
            .map_err(|e| Error::io(&native, e))
    }

    async fn remove(&self, path: &VaultPath) -> Result<()> {
        let native = self.to_native(path);
        let meta = match tokio::fs::metadata(&native).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io(&native, e)),
        };
        let result = if meta.is_dir() {
            tokio::fs::remove_dir_all(&native).await
        } else {
            tokio::fs::remove_file(&native).await
        };
        result.map_err(|e| Error::io(&native, e))
    }

    async fn exists(&self, path: &VaultPath) -> Result<bool> {
        let native = self.to_native(path);
        tokio::fs::try_exists(&native)
            .await
            .map_err(|e| Error::io(&native, e))
    }

    fn root_id(&self) -> String {
        self.root.to_string_lossy().to_string()
    }
}

fn system_time_ms(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}
