//! Persisted remote snapshot cache
//!
//! One JSON document per cache key (derived from local-root identity and
//! remote-root path). The cache survives interrupted seeds through the
//! embedded checkpoint and survives interrupted delta fetches because
//! batches are persisted before they are folded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_fs::VaultPath;
use vault_tree::Entry;

use crate::{DeltaEntry, Error, Result};

/// Resume point of an interrupted full traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCheckpoint {
    /// Continuation link for the next page; `None` means the first page
    /// has not been fetched yet.
    pub next: Option<String>,
}

/// One fetched change-feed batch, kept until folded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaBatch {
    /// Cursor positioned after this batch.
    pub cursor: String,
    pub entries: Vec<DeltaEntry>,
}

/// Cached remote state for one sync target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub files: BTreeMap<VaultPath, Entry>,
    /// Change-feed position the `files` map corresponds to.
    pub origin_cursor: String,
    /// Fetched but not yet folded batches; empty after compaction.
    pub deltas: Vec<DeltaBatch>,
    /// Present while a full traversal is still in progress.
    pub seed: Option<SeedCheckpoint>,
    pub fetched_at: DateTime<Utc>,
}

impl RemoteSnapshot {
    pub fn seeding(origin_cursor: String) -> Self {
        Self {
            files: BTreeMap::new(),
            origin_cursor,
            deltas: Vec::new(),
            seed: Some(SeedCheckpoint { next: None }),
            fetched_at: Utc::now(),
        }
    }

    /// Cursor to request the next delta batch from.
    pub fn resume_cursor(&self) -> &str {
        self.deltas
            .last()
            .map(|batch| batch.cursor.as_str())
            .unwrap_or(&self.origin_cursor)
    }
}

/// Durable storage for [`RemoteSnapshot`] values, one file per key.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Load the snapshot for `key`.
    ///
    /// A corrupt cache file is treated as absent (forcing a re-seed)
    /// rather than failing the run.
    pub fn load(&self, key: &str) -> Result<Option<RemoteSnapshot>> {
        let path = self.path_for(key);
        let Some(bytes) = vault_fs::io::read_if_exists(&path)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!("Discarding unreadable snapshot cache {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    pub fn save(&self, key: &str, snapshot: &RemoteSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec(snapshot).map_err(Error::Cache)?;
        vault_fs::io::write_atomic(&self.path_for(key), &bytes)?;
        Ok(())
    }

    /// Drop the cache for `key`, forcing the next run to re-seed.
    pub fn discard(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(vault_fs::Error::io(path.as_path(), e).into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
