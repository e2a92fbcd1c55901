//! The persisted memory of one reconciled path

use serde::{Deserialize, Serialize};
use vault_tree::Entry;

/// Last successfully reconciled state of a path on both sides.
///
/// `base` references a content-addressed blob equal to the file content
/// when this record was written; it is the ancestor for three-way
/// merges. Records are written only after a task's effect was observed
/// successful, and removed once both sides are gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub local: Entry,
    pub remote: Entry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

impl SyncRecord {
    pub fn new(local: Entry, remote: Entry) -> Self {
        Self {
            local,
            remote,
            base: None,
        }
    }

    pub fn with_base(mut self, key: impl Into<String>) -> Self {
        self.base = Some(key.into());
        self
    }
}
