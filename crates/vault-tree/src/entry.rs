//! Canonical entry representation
//!
//! One [`Entry`] describes one file or folder on either side of a sync:
//! its vault-relative path, kind, tombstone flag, modification time
//! (epoch milliseconds, meaningless for directories) and size (files
//! only). The basename is always recomputed from the path, never trusted
//! from input.

use serde::{Deserialize, Serialize};
use vault_fs::VaultPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: VaultPath,
    pub basename: String,
    pub is_dir: bool,
    #[serde(default)]
    pub is_deleted: bool,
    /// Epoch milliseconds. Meaningless for directories.
    #[serde(default)]
    pub mtime: i64,
    /// Bytes. Files only; always 0 for directories.
    #[serde(default)]
    pub size: u64,
    /// Set when filtering left this entry unreachable through a kept
    /// ancestor chain. Ignored entries count as absent for decisions.
    #[serde(default)]
    pub ignored: bool,
}

impl Entry {
    /// A file entry. The basename is derived from the path.
    pub fn file(path: impl Into<VaultPath>, mtime: i64, size: u64) -> Self {
        let path = path.into();
        Self {
            basename: basename_of(&path),
            path,
            is_dir: false,
            is_deleted: false,
            mtime,
            size,
            ignored: false,
        }
    }

    /// A directory entry. Directories carry no size or meaningful mtime.
    pub fn dir(path: impl Into<VaultPath>) -> Self {
        let path = path.into();
        Self {
            basename: basename_of(&path),
            path,
            is_dir: true,
            is_deleted: false,
            mtime: 0,
            size: 0,
            ignored: false,
        }
    }

    /// A deletion tombstone for the given path.
    pub fn tombstone(path: impl Into<VaultPath>, is_dir: bool) -> Self {
        let path = path.into();
        Self {
            basename: basename_of(&path),
            path,
            is_dir,
            is_deleted: true,
            mtime: 0,
            size: 0,
            ignored: false,
        }
    }

    /// Rebase this entry onto a different path, recomputing the basename.
    pub fn with_path(mut self, path: VaultPath) -> Self {
        self.basename = basename_of(&path);
        self.path = path;
        self
    }

    pub fn marked_ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// True when the entry represents something that actually exists:
    /// neither a tombstone nor filtered out.
    pub fn is_present(&self) -> bool {
        !self.is_deleted && !self.ignored
    }

    /// Re-derive the basename from the path. Input basenames are never
    /// trusted; deserialized entries pass through this.
    pub fn normalized(mut self) -> Self {
        self.basename = basename_of(&self.path);
        if self.is_dir {
            self.size = 0;
        }
        self
    }
}

fn basename_of(path: &VaultPath) -> String {
    path.file_name().unwrap_or_default().to_string()
}
