//! The sync task vocabulary
//!
//! A run is a plan of tasks executed strictly in order. Paths are
//! vault-relative; the executor maps them to the two sides (local root,
//! remote base dir) itself.

use serde::{Deserialize, Serialize};
use vault_fs::VaultPath;
use vault_tree::Entry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    /// Copy the remote file to the local side.
    Pull { path: VaultPath, remote: Entry },
    /// Copy the local file to the remote side.
    Push { path: VaultPath, local: Entry },
    /// Both sides changed; resolve per the configured strategy.
    ConflictResolve {
        path: VaultPath,
        local: Entry,
        remote: Entry,
        /// Blob key of the recorded merge base, when one exists.
        base: Option<String>,
    },
    /// Nothing to do, but the path was considered.
    Noop { path: VaultPath },
    /// Propagate a remote deletion.
    RemoveLocal { path: VaultPath },
    /// Propagate a local deletion.
    RemoveRemote { path: VaultPath },
    MkdirLocal { path: VaultPath },
    MkdirRemote { path: VaultPath },
    /// Drop a record whose path is gone on both sides.
    CleanRecord { path: VaultPath },
    /// The path cannot be created remotely; surfaces as a failed task.
    FilenameError { path: VaultPath, reason: String },
}

impl Task {
    pub fn path(&self) -> &VaultPath {
        match self {
            Task::Pull { path, .. }
            | Task::Push { path, .. }
            | Task::ConflictResolve { path, .. }
            | Task::Noop { path }
            | Task::RemoveLocal { path }
            | Task::RemoveRemote { path }
            | Task::MkdirLocal { path }
            | Task::MkdirRemote { path }
            | Task::CleanRecord { path }
            | Task::FilenameError { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Task::Pull { .. } => "pull",
            Task::Push { .. } => "push",
            Task::ConflictResolve { .. } => "conflict_resolve",
            Task::Noop { .. } => "noop",
            Task::RemoveLocal { .. } => "remove_local",
            Task::RemoveRemote { .. } => "remove_remote",
            Task::MkdirLocal { .. } => "mkdir_local",
            Task::MkdirRemote { .. } => "mkdir_remote",
            Task::CleanRecord { .. } => "clean_record",
            Task::FilenameError { .. } => "filename_error",
        }
    }

    /// True when executing this task cannot touch either side.
    pub fn is_inert(&self) -> bool {
        matches!(self, Task::Noop { .. } | Task::CleanRecord { .. })
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}

/// Outcome of one executed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: Task,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn ok(task: Task) -> Self {
        Self {
            task,
            success: true,
            error: None,
        }
    }

    pub fn failed(task: Task, error: impl ToString) -> Self {
        Self {
            task,
            success: false,
            error: Some(error.to_string()),
        }
    }
}
