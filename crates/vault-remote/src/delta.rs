//! Change-feed entries and their fold onto a cached snapshot

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vault_fs::VaultPath;
use vault_tree::Entry;

/// One operation against the cached remote snapshot.
///
/// Applied in feed order, last-write-wins per path; a deletion removes
/// the path (removing an absent path is a safe no-op).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub path: VaultPath,
    pub size: u64,
    pub is_deleted: bool,
    pub is_dir: bool,
    /// Epoch milliseconds.
    pub modified: i64,
    /// Server-assigned revision of this change.
    pub revision: String,
}

impl DeltaEntry {
    /// The snapshot entry this delta materializes. `None` for deletions.
    pub fn to_entry(&self) -> Option<Entry> {
        if self.is_deleted {
            return None;
        }
        Some(if self.is_dir {
            Entry::dir(self.path.clone())
        } else {
            Entry::file(self.path.clone(), self.modified, self.size)
        })
    }
}

/// Fold a delta sequence onto the snapshot file map, in order.
pub fn fold_deltas(
    files: &mut BTreeMap<VaultPath, Entry>,
    deltas: impl IntoIterator<Item = DeltaEntry>,
) {
    for delta in deltas {
        match delta.to_entry() {
            Some(entry) => {
                files.insert(delta.path, entry);
            }
            None => {
                files.remove(&delta.path);
            }
        }
    }
}
