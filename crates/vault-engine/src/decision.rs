//! The pure decision engine
//!
//! Takes the two current trees plus the persisted records and produces
//! an ordered task plan. Nothing here touches the network or the disk;
//! content checks against a recorded base go through [`BaseInspector`]
//! so the pass stays testable with fixed inputs.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use vault_fs::{PathFilter, VaultPath};
use vault_store::SyncRecord;
use vault_tree::Entry;

use crate::settings::{EqualityMode, SyncSettings};
use crate::task::Task;

/// Characters a path may not contain to be storable on the remote side.
const FORBIDDEN_REMOTE_CHARS: &[char] = &[':', '*', '?', '"', '<', '>', '|'];

/// Verifies whether current local content still equals a recorded base.
///
/// A changed mtime with unchanged content is a touch, not an edit; the
/// inspector lets the engine tell them apart without reading files
/// itself.
#[async_trait]
pub trait BaseInspector: Send + Sync {
    async fn local_matches_base(&self, path: &VaultPath, base_key: &str) -> bool;
}

/// Inspector that never consults content: any mtime drift is an edit.
pub struct TrustMtime;

#[async_trait]
impl BaseInspector for TrustMtime {
    async fn local_matches_base(&self, _path: &VaultPath, _base_key: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// A path is a file on one side and a folder on the other; the
    /// affected folder pass was abandoned for this run.
    TypeClash { path: VaultPath },
    /// File exceeds the configured size cap on at least one side.
    Oversized { path: VaultPath, size: u64 },
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanWarning::TypeClash { path } => {
                write!(f, "{path} is a file on one side and a folder on the other")
            }
            PlanWarning::Oversized { path, size } => {
                write!(f, "{path} exceeds the size cap ({size} bytes); skipped")
            }
        }
    }
}

/// Ordered tasks for one run, plus anything worth surfacing about paths
/// the plan deliberately leaves alone.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub tasks: Vec<Task>,
    pub warnings: Vec<PlanWarning>,
}

impl SyncPlan {
    /// True when no task would touch either side.
    pub fn is_settled(&self) -> bool {
        self.tasks.iter().all(Task::is_inert)
    }
}

/// Build the plan for one run.
///
/// Task order: remote folder removals (deepest first), local folder
/// removals (deepest first), local mkdirs, remote mkdirs, folder noops,
/// file tasks, record cleanups. Parents therefore exist before children
/// are created and children are gone before their folders are removed.
pub async fn decide(
    local_entries: &[Entry],
    remote_entries: &[Entry],
    records: &BTreeMap<VaultPath, SyncRecord>,
    settings: &SyncSettings,
    inspector: &dyn BaseInspector,
) -> SyncPlan {
    let filter = settings.filter();
    let mut warnings = Vec::new();

    let (local_files, local_dirs) = split_side(local_entries, &filter);
    let (remote_files, remote_dirs) = split_side(remote_entries, &filter);

    // File pass.
    let mut file_tasks = Vec::new();
    let mut clean_records = Vec::new();
    let mut file_paths: BTreeSet<&VaultPath> = local_files.keys().collect();
    file_paths.extend(remote_files.keys());
    file_paths.extend(records.iter().filter(|(_, r)| !r.local.is_dir).map(|(p, _)| p));

    for path in file_paths {
        if local_dirs.contains_key(path) || remote_dirs.contains_key(path) {
            // A folder pass owns this path; the clash is reported there.
            continue;
        }
        if !filter.check(path) {
            // Stale record for a path the filters no longer cover; the
            // record stays so re-including the path later still has a
            // base.
            continue;
        }
        let local = local_files.get(path);
        let remote = remote_files.get(path);

        if let Some(cap) = settings.max_file_size
            && let Some(size) = [local, remote]
                .into_iter()
                .flatten()
                .map(|e| e.size)
                .find(|size| *size > cap)
        {
            warnings.push(PlanWarning::Oversized {
                path: path.clone(),
                size,
            });
            continue;
        }

        let task = match (local, remote, records.get(path)) {
            (None, None, Some(_)) => Some(Task::CleanRecord { path: path.clone() }),
            (None, None, None) => None,
            (Some(local), None, None) => Some(push_task(path, local)),
            (None, Some(remote), None) => Some(Task::Pull {
                path: path.clone(),
                remote: remote.clone(),
            }),
            (Some(local), Some(remote), None) => {
                if settings.equality == EqualityMode::Loose && local.size == remote.size {
                    Some(Task::Noop { path: path.clone() })
                } else {
                    Some(Task::ConflictResolve {
                        path: path.clone(),
                        local: local.clone(),
                        remote: remote.clone(),
                        base: None,
                    })
                }
            }
            (local, remote, Some(record)) => {
                decide_recorded(path, local, remote, record, inspector).await
            }
        };
        match task {
            Some(task @ Task::CleanRecord { .. }) => clean_records.push(task),
            Some(task) => file_tasks.push(task),
            None => {}
        }
    }

    // Folder passes. A type clash abandons the clashing pass entirely;
    // the next run sees whatever the user did about it.
    let remote_pass = folder_pass(
        &remote_dirs,
        &local_dirs,
        &local_files,
        &remote_files,
        records,
        FolderDirection::RemoteToLocal,
        &mut warnings,
    );
    let local_pass = folder_pass(
        &local_dirs,
        &remote_dirs,
        &remote_files,
        &local_files,
        records,
        FolderDirection::LocalToRemote,
        &mut warnings,
    );

    // Orphaned folder records.
    for (path, record) in records {
        if !record.local.is_dir
            || local_dirs.contains_key(path)
            || remote_dirs.contains_key(path)
            || local_files.contains_key(path)
            || remote_files.contains_key(path)
            || !filter.check(path)
        {
            continue;
        }
        clean_records.push(Task::CleanRecord { path: path.clone() });
    }

    // Folder removals delete their surviving descendants with them;
    // file-level removals underneath collapse into record cleanups.
    let removal_roots: Vec<VaultPath> = remote_pass
        .removals
        .iter()
        .chain(&local_pass.removals)
        .map(|t| t.path().clone())
        .collect();
    let file_tasks: Vec<Task> = file_tasks
        .into_iter()
        .filter_map(|task| {
            let covered = matches!(task, Task::RemoveLocal { .. } | Task::RemoveRemote { .. })
                && removal_roots
                    .iter()
                    .any(|root| task.path() != root && task.path().starts_with(root));
            if covered {
                clean_records.push(Task::CleanRecord {
                    path: task.path().clone(),
                });
                None
            } else {
                Some(task)
            }
        })
        .collect();

    let mut tasks = Vec::new();
    tasks.extend(deepest_first(remote_pass.removals));
    tasks.extend(deepest_first(local_pass.removals));
    tasks.extend(remote_pass.mkdirs);
    tasks.extend(local_pass.mkdirs);
    tasks.extend(remote_pass.noops);
    tasks.extend(local_pass.noops);
    tasks.extend(file_tasks);
    clean_records.sort_by(|a, b| a.path().cmp(b.path()));
    clean_records.dedup();
    tasks.extend(clean_records);

    SyncPlan { tasks, warnings }
}

/// Present entries of one side that survive filtering, split by kind.
fn split_side(
    entries: &[Entry],
    filter: &PathFilter,
) -> (BTreeMap<VaultPath, Entry>, BTreeMap<VaultPath, Entry>) {
    let mut files = BTreeMap::new();
    let mut dirs = BTreeMap::new();
    for entry in entries {
        if !entry.is_present() || !filter.check(&entry.path) {
            continue;
        }
        if entry
            .path
            .ancestors()
            .iter()
            .any(|a| !a.is_root() && filter.is_excluded(a))
        {
            continue;
        }
        let target = if entry.is_dir { &mut dirs } else { &mut files };
        target.insert(entry.path.clone(), entry.clone());
    }
    (files, dirs)
}

async fn decide_recorded(
    path: &VaultPath,
    local: Option<&Entry>,
    remote: Option<&Entry>,
    record: &SyncRecord,
    inspector: &dyn BaseInspector,
) -> Option<Task> {
    let local_changed = match local {
        None => false,
        Some(entry) => {
            if entry.mtime == record.local.mtime && entry.size == record.local.size {
                false
            } else if let Some(base) = &record.base {
                !inspector.local_matches_base(path, base).await
            } else {
                true
            }
        }
    };
    let remote_changed = remote.is_some_and(|entry| {
        entry.mtime != record.remote.mtime || entry.size != record.remote.size
    });

    match (local, remote) {
        (Some(local), Some(remote)) => match (local_changed, remote_changed) {
            (false, false) => Some(Task::Noop { path: path.clone() }),
            (true, false) => Some(push_task(path, local)),
            (false, true) => Some(Task::Pull {
                path: path.clone(),
                remote: remote.clone(),
            }),
            (true, true) => Some(Task::ConflictResolve {
                path: path.clone(),
                local: local.clone(),
                remote: remote.clone(),
                base: record.base.clone(),
            }),
        },
        // Remote deleted it. A concurrent local edit outranks the
        // deletion and resurrects the file.
        (Some(local), None) => {
            if local_changed {
                Some(push_task(path, local))
            } else {
                Some(Task::RemoveLocal { path: path.clone() })
            }
        }
        // Local deleted it, mirrored.
        (None, Some(remote)) => {
            if remote_changed {
                Some(Task::Pull {
                    path: path.clone(),
                    remote: remote.clone(),
                })
            } else {
                Some(Task::RemoveRemote { path: path.clone() })
            }
        }
        (None, None) => Some(Task::CleanRecord { path: path.clone() }),
    }
}

fn push_task(path: &VaultPath, local: &Entry) -> Task {
    match forbidden_char(path) {
        Some(c) => Task::FilenameError {
            path: path.clone(),
            reason: format!("contains forbidden character {c:?}"),
        },
        None => Task::Push {
            path: path.clone(),
            local: local.clone(),
        },
    }
}

fn forbidden_char(path: &VaultPath) -> Option<char> {
    path.as_str()
        .chars()
        .find(|c| FORBIDDEN_REMOTE_CHARS.contains(c))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FolderDirection {
    RemoteToLocal,
    LocalToRemote,
}

#[derive(Default)]
struct FolderPassOutput {
    mkdirs: Vec<Task>,
    removals: Vec<Task>,
    noops: Vec<Task>,
}

/// One direction of the folder reconciliation.
///
/// `source` is the side whose folders drive the pass; `target` the side
/// they may be missing from. A folder present on both sides is a noop
/// (emitted by the remote-to-local direction only). A folder missing on
/// the target side is recreated there when the source side changed it
/// since the record, and removed from the source side when the record
/// proves the target deleted it and every surviving descendant is
/// faithfully recorded.
fn folder_pass(
    source_dirs: &BTreeMap<VaultPath, Entry>,
    target_dirs: &BTreeMap<VaultPath, Entry>,
    target_files: &BTreeMap<VaultPath, Entry>,
    source_files: &BTreeMap<VaultPath, Entry>,
    records: &BTreeMap<VaultPath, SyncRecord>,
    direction: FolderDirection,
    warnings: &mut Vec<PlanWarning>,
) -> FolderPassOutput {
    let mut out = FolderPassOutput::default();
    for (path, dir) in source_dirs {
        if target_files.contains_key(path) {
            warnings.push(PlanWarning::TypeClash { path: path.clone() });
            return FolderPassOutput::default();
        }
        if target_dirs.contains_key(path) {
            if direction == FolderDirection::RemoteToLocal {
                out.noops.push(Task::Noop { path: path.clone() });
            }
            continue;
        }
        let recorded_mtime = records.get(path).map(|r| match direction {
            FolderDirection::RemoteToLocal => r.remote.mtime,
            FolderDirection::LocalToRemote => r.local.mtime,
        });
        match recorded_mtime {
            // Never synced; adopted silently, folders propagate through
            // their contents.
            None => out.noops.push(Task::Noop { path: path.clone() }),
            Some(mtime) if dir.mtime != mtime => {
                let task = match direction {
                    FolderDirection::RemoteToLocal => Task::MkdirLocal { path: path.clone() },
                    FolderDirection::LocalToRemote => match forbidden_char(path) {
                        Some(c) => Task::FilenameError {
                            path: path.clone(),
                            reason: format!("contains forbidden character {c:?}"),
                        },
                        None => Task::MkdirRemote { path: path.clone() },
                    },
                };
                out.mkdirs.push(task);
            }
            Some(_) => {
                if descendants_faithful(path, source_files, source_dirs, records, direction) {
                    let task = match direction {
                        FolderDirection::RemoteToLocal => Task::RemoveRemote { path: path.clone() },
                        FolderDirection::LocalToRemote => Task::RemoveLocal { path: path.clone() },
                    };
                    out.removals.push(task);
                }
                // Unrecorded or drifted content below: leave the folder
                // alone this run.
            }
        }
    }
    out
}

/// Every surviving entry below `path` on the driving side must match
/// its record before the folder may be deleted there.
fn descendants_faithful(
    path: &VaultPath,
    source_files: &BTreeMap<VaultPath, Entry>,
    source_dirs: &BTreeMap<VaultPath, Entry>,
    records: &BTreeMap<VaultPath, SyncRecord>,
    direction: FolderDirection,
) -> bool {
    let recorded_side = |record: &SyncRecord| match direction {
        FolderDirection::RemoteToLocal => record.remote.clone(),
        FolderDirection::LocalToRemote => record.local.clone(),
    };
    let files_ok = source_files
        .iter()
        .filter(|(p, _)| p.starts_with(path))
        .all(|(p, entry)| {
            records.get(p).is_some_and(|r| {
                let recorded = recorded_side(r);
                recorded.mtime == entry.mtime && recorded.size == entry.size
            })
        });
    let dirs_ok = source_dirs
        .iter()
        .filter(|(p, _)| *p != path && p.starts_with(path))
        .all(|(p, _)| records.contains_key(p));
    files_ok && dirs_ok
}

fn deepest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| {
        b.path()
            .depth()
            .cmp(&a.path().depth())
            .then_with(|| a.path().cmp(b.path()))
    });
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Inspector that always confirms the base, so mtime drift alone
    /// never counts as an edit.
    struct ContentUnchanged;

    #[async_trait]
    impl BaseInspector for ContentUnchanged {
        async fn local_matches_base(&self, _: &VaultPath, _: &str) -> bool {
            true
        }
    }

    fn file(path: &str, mtime: i64, size: u64) -> Entry {
        Entry::file(path, mtime, size)
    }

    fn recorded(path: &str, mtime: i64, size: u64) -> (VaultPath, SyncRecord) {
        (
            VaultPath::new(path),
            SyncRecord::new(file(path, mtime, size), file(path, mtime, size)).with_base("sha256:b"),
        )
    }

    fn dir_record(path: &str, mtime: i64) -> (VaultPath, SyncRecord) {
        let mut entry = Entry::dir(path);
        entry.mtime = mtime;
        (
            VaultPath::new(path),
            SyncRecord::new(entry.clone(), entry),
        )
    }

    async fn plan(
        local: &[Entry],
        remote: &[Entry],
        records: &[(VaultPath, SyncRecord)],
        settings: &SyncSettings,
    ) -> SyncPlan {
        let records: BTreeMap<_, _> = records.iter().cloned().collect();
        decide(local, remote, &records, settings, &TrustMtime).await
    }

    fn kinds(plan: &SyncPlan) -> Vec<(&'static str, String)> {
        plan.tasks
            .iter()
            .map(|t| (t.kind(), t.path().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn remote_only_file_is_pulled() {
        let p = plan(
            &[],
            &[file("/a.md", 5, 10)],
            &[],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("pull", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn local_only_file_is_pushed() {
        let p = plan(&[file("/a.md", 5, 10)], &[], &[], &SyncSettings::default()).await;
        assert_eq!(kinds(&p), vec![("push", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn forbidden_characters_surface_as_filename_errors() {
        let p = plan(
            &[file("/what?.md", 5, 10)],
            &[],
            &[],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("filename_error", "/what?.md".to_string())]);
    }

    #[tokio::test]
    async fn unrecorded_pair_conflicts_under_strict_equality() {
        let p = plan(
            &[file("/a.md", 5, 10)],
            &[file("/a.md", 7, 12)],
            &[],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("conflict_resolve", "/a.md".to_string())]);
        let Task::ConflictResolve { base, .. } = &p.tasks[0] else {
            unreachable!()
        };
        assert_eq!(*base, None);
    }

    #[tokio::test]
    async fn unrecorded_pair_with_equal_sizes_is_a_noop_under_loose_equality() {
        let settings = SyncSettings {
            equality: EqualityMode::Loose,
            ..SyncSettings::default()
        };
        let p = plan(
            &[file("/a.md", 5, 10)],
            &[file("/a.md", 7, 10)],
            &[],
            &settings,
        )
        .await;
        assert_eq!(kinds(&p), vec![("noop", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn recorded_unchanged_pair_is_a_noop() {
        let p = plan(
            &[file("/a.md", 5, 10)],
            &[file("/a.md", 5, 10)],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("noop", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn one_sided_edits_propagate() {
        let p = plan(
            &[file("/a.md", 9, 11)],
            &[file("/a.md", 5, 10)],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("push", "/a.md".to_string())]);

        let p = plan(
            &[file("/a.md", 5, 10)],
            &[file("/a.md", 9, 11)],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("pull", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn edits_on_both_sides_resolve_with_the_recorded_base() {
        let p = plan(
            &[file("/a.md", 9, 11)],
            &[file("/a.md", 8, 12)],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        let Task::ConflictResolve { base, .. } = &p.tasks[0] else {
            panic!("expected a conflict, got {:?}", p.tasks)
        };
        assert_eq!(base.as_deref(), Some("sha256:b"));
    }

    #[tokio::test]
    async fn mtime_drift_with_unchanged_content_is_not_an_edit() {
        let records: BTreeMap<_, _> = [recorded("/a.md", 5, 10)].into_iter().collect();
        let p = decide(
            &[file("/a.md", 9, 10)],
            &[file("/a.md", 5, 10)],
            &records,
            &SyncSettings::default(),
            &ContentUnchanged,
        )
        .await;
        assert_eq!(kinds(&p), vec![("noop", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn remote_deletion_propagates_when_local_is_unchanged() {
        let p = plan(
            &[file("/a.md", 5, 10)],
            &[],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("remove_local", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn local_edit_outranks_remote_deletion() {
        let p = plan(
            &[file("/a.md", 9, 12)],
            &[],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("push", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn local_deletion_propagates_and_remote_edit_outranks_it() {
        let p = plan(
            &[],
            &[file("/a.md", 5, 10)],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("remove_remote", "/a.md".to_string())]);

        let p = plan(
            &[],
            &[file("/a.md", 9, 12)],
            &[recorded("/a.md", 5, 10)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("pull", "/a.md".to_string())]);
    }

    #[tokio::test]
    async fn orphaned_records_are_cleaned() {
        let p = plan(
            &[],
            &[],
            &[recorded("/gone.md", 5, 10), dir_record("/gone-dir", 3)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(
            kinds(&p),
            vec![
                ("clean_record", "/gone-dir".to_string()),
                ("clean_record", "/gone.md".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn oversized_files_are_skipped_with_a_warning() {
        let settings = SyncSettings {
            max_file_size: Some(100),
            ..SyncSettings::default()
        };
        let p = plan(&[file("/big.bin", 5, 101)], &[], &[], &settings).await;
        assert!(p.tasks.is_empty());
        assert_eq!(
            p.warnings,
            vec![PlanWarning::Oversized {
                path: VaultPath::new("/big.bin"),
                size: 101,
            }]
        );
    }

    #[tokio::test]
    async fn excluded_paths_are_invisible_to_the_plan() {
        let settings = SyncSettings {
            exclude: vec!["private/**".to_string(), "private".to_string()],
            ..SyncSettings::default()
        };
        let p = plan(
            &[
                Entry::dir("/private"),
                file("/private/secret.md", 5, 10),
                file("/open.md", 5, 10),
            ],
            &[],
            &[],
            &settings,
        )
        .await;
        assert_eq!(kinds(&p), vec![("push", "/open.md".to_string())]);
    }

    #[tokio::test]
    async fn adopted_folders_present_on_both_sides_are_noops() {
        let p = plan(
            &[Entry::dir("/notes")],
            &[Entry::dir("/notes")],
            &[],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("noop", "/notes".to_string())]);
    }

    #[tokio::test]
    async fn recorded_folder_gone_locally_is_removed_remotely_deepest_first() {
        let remote = vec![
            Entry::dir("/old"),
            Entry::dir("/old/sub"),
            file("/old/sub/a.md", 5, 10),
        ];
        let records = vec![
            dir_record("/old", 0),
            dir_record("/old/sub", 0),
            recorded("/old/sub/a.md", 5, 10),
        ];
        let p = plan(&[], &remote, &records, &SyncSettings::default()).await;
        // Folders are removed child before parent; the file underneath
        // goes with them, leaving only its record to clean.
        assert_eq!(
            kinds(&p),
            vec![
                ("remove_remote", "/old/sub".to_string()),
                ("remove_remote", "/old".to_string()),
                ("clean_record", "/old/sub/a.md".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn folder_with_drifted_descendants_is_left_alone() {
        // The file below the folder was edited remotely since its
        // record, so the folder must not be removed.
        let remote = vec![Entry::dir("/old"), file("/old/a.md", 9, 12)];
        let records = vec![dir_record("/old", 0), recorded("/old/a.md", 5, 10)];
        let p = plan(&[], &remote, &records, &SyncSettings::default()).await;
        assert!(
            !kinds(&p).contains(&("remove_remote", "/old".to_string())),
            "got {:?}",
            kinds(&p)
        );
        assert!(kinds(&p).contains(&("pull", "/old/a.md".to_string())));
    }

    #[tokio::test]
    async fn recreated_remote_folder_is_made_locally() {
        let mut remote_dir = Entry::dir("/back");
        remote_dir.mtime = 9;
        let p = plan(
            &[],
            &[remote_dir],
            &[dir_record("/back", 3)],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(kinds(&p), vec![("mkdir_local", "/back".to_string())]);
    }

    #[tokio::test]
    async fn type_clash_abandons_the_folder_pass_with_a_warning() {
        let p = plan(
            &[file("/thing", 5, 10)],
            &[Entry::dir("/thing"), file("/other.md", 5, 10)],
            &[],
            &SyncSettings::default(),
        )
        .await;
        assert_eq!(
            p.warnings,
            vec![PlanWarning::TypeClash {
                path: VaultPath::new("/thing"),
            }]
        );
        // The file pass still runs.
        assert!(kinds(&p).contains(&("pull", "/other.md".to_string())));
        assert!(!kinds(&p).iter().any(|(_, p)| p == "/thing"));
    }

    #[tokio::test]
    async fn removals_come_before_mkdirs_and_files() {
        let mut recreated = Entry::dir("/made");
        recreated.mtime = 9;
        let local = vec![file("/a.md", 5, 10)];
        let remote = vec![recreated, Entry::dir("/gone")];
        let records = vec![dir_record("/made", 3), dir_record("/gone", 0)];
        let p = plan(&local, &remote, &records, &SyncSettings::default()).await;
        assert_eq!(
            kinds(&p),
            vec![
                ("remove_remote", "/gone".to_string()),
                ("mkdir_local", "/made".to_string()),
                ("push", "/a.md".to_string()),
            ]
        );
    }
}
