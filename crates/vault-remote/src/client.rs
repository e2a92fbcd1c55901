//! The remote protocol port consumed by the reconciler and executor

use std::sync::Arc;

use async_trait::async_trait;
use vault_fs::VaultPath;
use vault_tree::Entry;

use crate::{DeltaEntry, Result};

/// One page of a full remote traversal.
///
/// `next` is the continuation link for the following page, mirroring a
/// continuation-link response header; `None` ends the traversal.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub entries: Vec<Entry>,
    pub next: Option<String>,
}

/// One batch from the change feed.
#[derive(Debug, Clone)]
pub struct DeltaPage {
    /// Cursor positioned after the entries of this page.
    pub cursor: String,
    /// Server-side history reset: the requesting cache is invalid and
    /// must be re-seeded by a full traversal.
    pub reset: bool,
    pub has_more: bool,
    pub entries: Vec<DeltaEntry>,
}

/// Opaque remote store behind a network file-transfer protocol.
///
/// All paths are absolute remote paths; rewriting them relative to the
/// configured base dir is the reconciler's job, not the client's.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch one page of the full listing; `link == None` starts over.
    async fn list_page(&self, link: Option<&str>) -> Result<ListPage>;

    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>>;

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>>;

    async fn write(&self, path: &VaultPath, bytes: &[u8], overwrite: bool) -> Result<()>;

    async fn mkdir(&self, path: &VaultPath, recursive: bool) -> Result<()>;

    async fn delete(&self, path: &VaultPath) -> Result<()>;

    /// Cursor marking "now" in the change feed.
    async fn latest_cursor(&self) -> Result<String>;

    /// Changes recorded after `cursor`.
    async fn delta(&self, cursor: &str) -> Result<DeltaPage>;
}

// Shared handles are clients too; wrappers like `ThrottledClient` can
// then sit in front of an `Arc<dyn RemoteClient>`.
#[async_trait]
impl<T: RemoteClient + ?Sized> RemoteClient for Arc<T> {
    async fn list_page(&self, link: Option<&str>) -> Result<ListPage> {
        (**self).list_page(link).await
    }

    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>> {
        (**self).stat(path).await
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        (**self).read(path).await
    }

    async fn write(&self, path: &VaultPath, bytes: &[u8], overwrite: bool) -> Result<()> {
        (**self).write(path, bytes, overwrite).await
    }

    async fn mkdir(&self, path: &VaultPath, recursive: bool) -> Result<()> {
        (**self).mkdir(path, recursive).await
    }

    async fn delete(&self, path: &VaultPath) -> Result<()> {
        (**self).delete(path).await
    }

    async fn latest_cursor(&self) -> Result<String> {
        (**self).latest_cursor().await
    }

    async fn delta(&self, cursor: &str) -> Result<DeltaPage> {
        (**self).delta(cursor).await
    }
}
