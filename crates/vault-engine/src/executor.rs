//! The sync run state machine
//!
//! Preparing → Deciding → Executing → UpdatingRecords, strictly in that
//! order, with the tasks of a plan executed sequentially. Interruption
//! is safe at any point: records are written only for tasks whose
//! effect was observed, so the next run re-derives whatever was cut
//! off.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinSet;
use vault_fs::VaultPath;
use vault_local::{LocalAdapter, walk_local};
use vault_remote::{Reconciler, RemoteClient, RemoteView, SnapshotStore};
use vault_store::{BlobStore, RecordStore, SyncRecord};
use vault_tree::Entry;

use crate::cancel::{CancelToken, sleep_cancellable};
use crate::decision::{BaseInspector, PlanWarning, SyncPlan, decide};
use crate::resolver::{Version, resolve};
use crate::settings::SyncSettings;
use crate::task::{Task, TaskResult};
use crate::{Error, Result};

/// Record writes per concurrent batch after execution.
const RECORD_BATCH: usize = 10;

/// Snapshot of a run handed to the progress sink after every task.
pub struct Progress<'a> {
    pub total: usize,
    pub completed: &'a [TaskResult],
}

pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &Progress<'_>);
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task was attempted and records were updated.
    Done,
    /// Cancelled before or between tasks; completed work is recorded.
    Cancelled,
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub results: Vec<TaskResult>,
    pub warnings: Vec<PlanWarning>,
    /// Wall-clock time the run took, throttle waits included.
    pub duration: Duration,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.completed()
    }
}

/// Per-run knobs that are not part of the persisted settings.
#[derive(Default)]
pub struct RunOptions<'a> {
    pub cancel: CancelToken,
    pub progress: Option<&'a dyn ProgressSink>,
    /// Inspect the plan before anything executes; returning `false`
    /// cancels the run untouched.
    pub confirm: Option<&'a (dyn Fn(&SyncPlan) -> bool + Send + Sync)>,
}

/// Drives one sync target end to end.
pub struct SyncRunner {
    local: Arc<dyn LocalAdapter>,
    remote: Arc<dyn RemoteClient>,
    records: RecordStore,
    blobs: BlobStore,
    snapshots: SnapshotStore,
    settings: SyncSettings,
}

impl SyncRunner {
    pub fn new(
        local: Arc<dyn LocalAdapter>,
        remote: Arc<dyn RemoteClient>,
        records: RecordStore,
        blobs: BlobStore,
        snapshots: SnapshotStore,
        settings: SyncSettings,
    ) -> Self {
        Self {
            local,
            remote,
            records,
            blobs,
            snapshots,
            settings,
        }
    }

    /// Build the plan without executing anything.
    pub async fn plan(&self, cancel: &CancelToken) -> Result<SyncPlan> {
        self.with_throttle_retry(cancel, || self.ensure_remote_base())
            .await?;
        let (plan, _, _) = self.build_plan(cancel).await?;
        Ok(plan)
    }

    /// Run a full sync cycle.
    ///
    /// Fatal infrastructure failures return `Err`; individual task
    /// failures are reported per task and never abort the run.
    pub async fn run(&self, options: &RunOptions<'_>) -> Result<RunReport> {
        let cancel = &options.cancel;
        let started = Instant::now();
        tracing::info!("Sync run starting");

        self.with_throttle_retry(cancel, || self.ensure_remote_base())
            .await?;
        if cancel.is_cancelled() {
            return Ok(cancelled_report(Vec::new(), Vec::new(), started));
        }

        let (plan, key, _records) = self.build_plan(cancel).await?;
        if let Some(confirm) = options.confirm
            && !confirm(&plan)
        {
            tracing::info!("Plan rejected by confirmation hook");
            return Ok(cancelled_report(Vec::new(), plan.warnings, started));
        }

        let total = plan.tasks.len();
        let mut results: Vec<TaskResult> = Vec::with_capacity(total);
        let mut outcome = RunOutcome::Done;
        for task in &plan.tasks {
            if cancel.is_cancelled() {
                tracing::info!("Cancelled after {} of {total} tasks", results.len());
                outcome = RunOutcome::Cancelled;
                break;
            }
            let result = match self
                .with_throttle_retry(cancel, || self.execute_task(task))
                .await
            {
                Ok(()) => TaskResult::ok(task.clone()),
                Err(Error::Cancelled) => {
                    outcome = RunOutcome::Cancelled;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Task {task} failed: {e}");
                    TaskResult::failed(task.clone(), e)
                }
            };
            results.push(result);
            if let Some(sink) = options.progress {
                sink.on_progress(&Progress {
                    total,
                    completed: &results,
                });
            }
        }

        self.update_records(&key, &results).await?;
        tracing::info!(
            completed = results.iter().filter(|r| r.success).count(),
            failed = results.iter().filter(|r| !r.success).count(),
            "Sync run finished"
        );
        Ok(RunReport {
            outcome,
            results,
            warnings: plan.warnings,
            duration: started.elapsed(),
        })
    }

    async fn build_plan(
        &self,
        cancel: &CancelToken,
    ) -> Result<(SyncPlan, String, BTreeMap<VaultPath, SyncRecord>)> {
        let key = RecordStore::store_key(&self.local.root_id(), &self.settings.remote_base);
        let view = RemoteView {
            base: self.settings.remote_base.clone(),
            filter: self.settings.filter(),
        };
        let reconciler = Reconciler::new(self.remote.as_ref(), &self.snapshots, key.clone());
        let remote_entries = self
            .with_throttle_retry(cancel, || async {
                Ok(reconciler.current_remote_entries(&view).await?)
            })
            .await?;
        let local_entries = walk_local(self.local.as_ref()).await?;
        let records = self.records.load(&key)?;
        let inspector = BlobInspector {
            local: self.local.clone(),
            blobs: self.blobs.clone(),
        };
        let plan = decide(
            &local_entries,
            &remote_entries,
            &records,
            &self.settings,
            &inspector,
        )
        .await;
        tracing::info!(
            tasks = plan.tasks.len(),
            warnings = plan.warnings.len(),
            "Plan ready"
        );
        Ok((plan, key, records))
    }

    /// The remote base dir must exist as a directory before anything
    /// else; create it when missing.
    async fn ensure_remote_base(&self) -> Result<()> {
        let base = &self.settings.remote_base;
        if base.is_root() {
            return Ok(());
        }
        match self.remote.stat(base).await? {
            Some(entry) if entry.is_dir => Ok(()),
            Some(_) => Err(Error::RemoteBase(format!(
                "{base} exists but is not a directory"
            ))),
            None => {
                tracing::info!("Creating remote base dir {base}");
                self.remote.mkdir(base, true).await?;
                Ok(())
            }
        }
    }

    fn remote_path(&self, path: &VaultPath) -> VaultPath {
        self.settings.remote_base.join(path.as_str())
    }

    /// Retry the operation after a wait for as long as the remote keeps
    /// throttling; only cancellation breaks the loop.
    async fn with_throttle_retry<T, F, Fut>(&self, cancel: &CancelToken, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            match op().await {
                Err(e) if e.is_throttled() => {
                    let wait = e.retry_after().unwrap_or(self.settings.throttle_wait());
                    tracing::warn!("Remote throttled; retrying in {}s", wait.as_secs());
                    if !sleep_cancellable(wait, cancel).await {
                        return Err(Error::Cancelled);
                    }
                }
                other => return other,
            }
        }
    }

    async fn execute_task(&self, task: &Task) -> Result<()> {
        tracing::debug!("Executing {task}");
        match task {
            Task::Noop { .. } | Task::CleanRecord { .. } => Ok(()),
            Task::FilenameError { path, reason } => Err(Error::InvalidFilename {
                path: path.clone(),
                reason: reason.clone(),
            }),
            Task::Pull { path, .. } => {
                let bytes = self.remote.read(&self.remote_path(path)).await?;
                self.local.write(path, &bytes).await?;
                Ok(())
            }
            Task::Push { path, .. } => {
                let bytes = self.local.read(path).await?;
                let target = self.remote_path(path);
                if let Some(parent) = target.parent()
                    && !parent.is_root()
                {
                    self.remote.mkdir(&parent, true).await?;
                }
                self.remote.write(&target, &bytes, true).await?;
                Ok(())
            }
            Task::ConflictResolve {
                path,
                local,
                remote,
                base,
            } => self.resolve_conflict(path, local, remote, base.as_deref()).await,
            Task::RemoveLocal { path } => Ok(self.local.remove(path).await?),
            Task::RemoveRemote { path } => {
                Ok(self.remote.delete(&self.remote_path(path)).await?)
            }
            Task::MkdirLocal { path } => Ok(self.local.create_folder(path).await?),
            Task::MkdirRemote { path } => {
                Ok(self.remote.mkdir(&self.remote_path(path), true).await?)
            }
        }
    }

    async fn resolve_conflict(
        &self,
        path: &VaultPath,
        local_entry: &Entry,
        remote_entry: &Entry,
        base_key: Option<&str>,
    ) -> Result<()> {
        let remote_path = self.remote_path(path);
        let local = Version {
            bytes: self.local.read(path).await?,
            mtime: local_entry.mtime,
        };
        let remote = Version {
            bytes: self.remote.read(&remote_path).await?,
            mtime: remote_entry.mtime,
        };
        let base = match base_key {
            Some(key) => self.blobs.get(key)?,
            None => None,
        };
        let resolution = resolve(path, &self.settings, base.as_deref(), &local, &remote)?;
        if resolution.write_remote {
            self.remote
                .write(&remote_path, &resolution.content, true)
                .await?;
        }
        if resolution.write_local {
            self.local.write(path, &resolution.content).await?;
        }
        Ok(())
    }

    /// Re-stat both sides for every successful task and persist the new
    /// records, in concurrent batches. Failures here are logged and
    /// skipped; the next run re-derives the affected paths.
    async fn update_records(&self, key: &str, results: &[TaskResult]) -> Result<()> {
        let mut map = self.records.load(key)?;
        let successful: Vec<&Task> = results
            .iter()
            .filter(|r| r.success)
            .map(|r| &r.task)
            .collect();

        for batch in successful.chunks(RECORD_BATCH) {
            let mut joins = JoinSet::new();
            for task in batch {
                let task = (*task).clone();
                let local = self.local.clone();
                let remote = self.remote.clone();
                let blobs = self.blobs.clone();
                let remote_base = self.settings.remote_base.clone();
                joins.spawn(async move {
                    compute_update(task, local, remote, blobs, remote_base).await
                });
            }
            while let Some(joined) = joins.join_next().await {
                match joined {
                    Ok(Ok(Some(RecordUpdate::Put(path, record)))) => {
                        map.insert(path, record);
                    }
                    Ok(Ok(Some(RecordUpdate::Drop(path)))) => {
                        map.remove(&path);
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => tracing::warn!("Record update failed: {e}"),
                    Err(e) => tracing::warn!("Record update panicked: {e}"),
                }
            }
        }

        self.records.save(key, &map)?;
        Ok(())
    }
}

fn cancelled_report(
    results: Vec<TaskResult>,
    warnings: Vec<PlanWarning>,
    started: Instant,
) -> RunReport {
    RunReport {
        outcome: RunOutcome::Cancelled,
        results,
        warnings,
        duration: started.elapsed(),
    }
}

enum RecordUpdate {
    Put(VaultPath, SyncRecord),
    Drop(VaultPath),
}

async fn compute_update(
    task: Task,
    local: Arc<dyn LocalAdapter>,
    remote: Arc<dyn RemoteClient>,
    blobs: BlobStore,
    remote_base: VaultPath,
) -> Result<Option<RecordUpdate>> {
    let path = task.path().clone();
    let remote_path = remote_base.join(path.as_str());
    match task {
        Task::Pull { .. } | Task::Push { .. } | Task::ConflictResolve { .. } => {
            let Some(local_entry) = local.stat(&path).await? else {
                tracing::warn!("No local entry at {path} after sync; skipping record");
                return Ok(None);
            };
            let Some(remote_entry) = remote.stat(&remote_path).await? else {
                tracing::warn!("No remote entry at {remote_path} after sync; skipping record");
                return Ok(None);
            };
            let bytes = local.read(&path).await?;
            let base = blobs.put(&bytes)?;
            let record = SyncRecord::new(
                local_entry,
                remote_entry.with_path(path.clone()).normalized(),
            )
            .with_base(base);
            Ok(Some(RecordUpdate::Put(path, record)))
        }
        Task::MkdirLocal { .. } | Task::MkdirRemote { .. } => {
            let local_entry = local
                .stat(&path)
                .await?
                .unwrap_or_else(|| Entry::dir(path.clone()));
            let remote_entry = remote
                .stat(&remote_path)
                .await?
                .map(|e| e.with_path(path.clone()).normalized())
                .unwrap_or_else(|| Entry::dir(path.clone()));
            Ok(Some(RecordUpdate::Put(
                path.clone(),
                SyncRecord::new(local_entry, remote_entry),
            )))
        }
        Task::RemoveLocal { .. } | Task::RemoveRemote { .. } | Task::CleanRecord { .. } => {
            Ok(Some(RecordUpdate::Drop(path)))
        }
        Task::Noop { .. } | Task::FilenameError { .. } => Ok(None),
    }
}

/// Compares current local content against a recorded base blob.
struct BlobInspector {
    local: Arc<dyn LocalAdapter>,
    blobs: BlobStore,
}

#[async_trait]
impl BaseInspector for BlobInspector {
    async fn local_matches_base(&self, path: &VaultPath, base_key: &str) -> bool {
        match self.local.read(path).await {
            Ok(bytes) => vault_fs::checksum::compute_content_checksum(&bytes) == base_key,
            Err(_) => false,
        }
    }
}
