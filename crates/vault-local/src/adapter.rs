//! The local store port consumed by the sync engine

use async_trait::async_trait;
use vault_fs::VaultPath;
use vault_tree::Entry;

use crate::Result;

/// Direct children of one directory, split by kind.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub files: Vec<Entry>,
    pub folders: Vec<Entry>,
}

/// Opaque local store: list/stat/read/write/delete/mkdir.
///
/// The engine never touches the filesystem directly; everything local
/// goes through this trait so tests can substitute an in-memory store.
#[async_trait]
pub trait LocalAdapter: Send + Sync {
    /// Direct children of `dir`.
    async fn list(&self, dir: &VaultPath) -> Result<Listing>;

    /// Entry at `path`, or `None` when absent.
    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>>;

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>>;

    /// Write a file, creating intermediate directories.
    async fn write(&self, path: &VaultPath, bytes: &[u8]) -> Result<()>;

    /// `mkdir -p`.
    async fn create_folder(&self, path: &VaultPath) -> Result<()>;

    /// Remove a file or a directory tree. Absent paths are a no-op.
    async fn remove(&self, path: &VaultPath) -> Result<()>;

    async fn exists(&self, path: &VaultPath) -> Result<bool>;

    /// Stable identity of the underlying root, used to key persisted
    /// per-target state.
    fn root_id(&self) -> String;
}

/// Walk the whole local tree, root excluded, sorted by path.
pub async fn walk_local(adapter: &dyn LocalAdapter) -> Result<Vec<Entry>> {
    let mut out = Vec::new();
    let mut queue = vec![VaultPath::root()];
    while let Some(dir) = queue.pop() {
        let listing = adapter.list(&dir).await?;
        for folder in listing.folders {
            queue.push(folder.path.clone());
            out.push(folder);
        }
        out.extend(listing.files);
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}
