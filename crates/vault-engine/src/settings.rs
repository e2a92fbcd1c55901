//! Per-target sync configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vault_fs::{PathFilter, VaultPath};

use crate::{Error, Result};

/// How concurrent edits to the same file are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// The side with the newer modification time wins verbatim.
    LatestTimestamp,
    /// Three-way line merge against the recorded base, falling back to
    /// re-applying the remote edits as a context patch.
    #[default]
    IntelligentMerge,
}

/// How two files with no shared record are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityMode {
    /// Unrecorded pairs are always treated as a potential conflict.
    #[default]
    Strict,
    /// Unrecorded pairs with equal sizes are assumed identical.
    Loose,
}

/// Settings for one sync target.
///
/// Deserialized from TOML with every field optional; unknown keys are
/// rejected so typos surface instead of silently reverting to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub strategy: ConflictStrategy,
    /// Files larger than this on either side are skipped. `None` means
    /// unlimited.
    pub max_file_size: Option<u64>,
    /// Include globs; empty means include everything.
    pub include: Vec<String>,
    /// Exclude globs; exclusion wins over inclusion.
    pub exclude: Vec<String>,
    pub equality: EqualityMode,
    /// Write a conflict-marker document instead of failing when a merge
    /// cannot be resolved automatically.
    pub conflict_markers: bool,
    /// Remote directory the vault is rooted at.
    pub remote_base: VaultPath,
    /// Seconds to wait before retrying a rate-limited operation.
    pub throttle_wait_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            strategy: ConflictStrategy::default(),
            max_file_size: None,
            include: Vec::new(),
            exclude: Vec::new(),
            equality: EqualityMode::default(),
            conflict_markers: false,
            remote_base: VaultPath::root(),
            throttle_wait_secs: 60,
        }
    }
}

impl SyncSettings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(Error::Settings)
    }

    /// Compile the include/exclude globs into a runtime filter.
    pub fn filter(&self) -> PathFilter {
        PathFilter::new(&self.include, &self.exclude)
    }

    pub fn throttle_wait(&self) -> Duration {
        Duration::from_secs(self.throttle_wait_secs)
    }
}
