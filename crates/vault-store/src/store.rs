//! Durable path→record maps, one per sync target

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use vault_fs::{VaultPath, checksum};

use crate::{Error, Result, SyncRecord};

/// Persistent key→(path→record) store.
///
/// The key identifies one sync target: a hash over the local-root
/// identity and the remote-root path. This store is the sole writer of
/// persisted records; the decision engine only reads the maps it loads.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Derive the store key for a sync target.
    pub fn store_key(local_root_id: &str, remote_base: &VaultPath) -> String {
        checksum::derive_key(&[local_root_id, remote_base.as_str()])
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Load all records for a target. A missing file is an empty map; a
    /// corrupt file is treated as empty with a warning (the next run
    /// will re-reconcile from scratch).
    pub fn load(&self, key: &str) -> Result<BTreeMap<VaultPath, SyncRecord>> {
        let path = self.path_for(key);
        let Some(bytes) = vault_fs::io::read_if_exists(&path)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    "Discarding unreadable record store {}: {e}",
                    path.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Replace the whole record map for a target.
    pub fn save(&self, key: &str, records: &BTreeMap<VaultPath, SyncRecord>) -> Result<()> {
        let bytes = serde_json::to_vec(records).map_err(Error::Serialization)?;
        vault_fs::io::write_atomic(&self.path_for(key), &bytes)?;
        Ok(())
    }

    /// Upsert one record.
    pub fn update(&self, key: &str, path: &VaultPath, record: SyncRecord) -> Result<()> {
        let mut records = self.load(key)?;
        records.insert(path.clone(), record);
        self.save(key, &records)
    }

    /// Remove one record (orphan cleanup). Absent paths are a no-op.
    pub fn remove(&self, key: &str, path: &VaultPath) -> Result<()> {
        let mut records = self.load(key)?;
        if records.remove(path).is_some() {
            self.save(key, &records)?;
        }
        Ok(())
    }

    /// Drop every persisted target map.
    pub fn drop_all(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        let reader = std::fs::read_dir(&self.dir)
            .map_err(|e| vault_fs::Error::io(self.dir.as_path(), e))?;
        for item in reader {
            let item = item.map_err(|e| vault_fs::Error::io(self.dir.as_path(), e))?;
            if item.path().extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(item.path())
                    .map_err(|e| vault_fs::Error::io(item.path(), e))?;
            }
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
