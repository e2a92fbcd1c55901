//! Remote state reconciliation
//!
//! Produces the current flat remote entry list without a full listing on
//! every run: a persisted snapshot is refreshed by replaying the change
//! feed, then projected into the configured base dir and filters.

use std::collections::BTreeMap;

use vault_fs::{PathFilter, VaultPath};
use vault_tree::Entry;

use crate::snapshot::{DeltaBatch, RemoteSnapshot, SeedCheckpoint, SnapshotStore};
use crate::{RemoteClient, Result};

/// How the raw remote namespace maps onto the vault.
#[derive(Debug, Clone)]
pub struct RemoteView {
    /// Remote directory the vault is rooted at; entries outside it are
    /// invisible.
    pub base: VaultPath,
    pub filter: PathFilter,
}

/// Refreshes and projects the cached remote state for one sync target.
pub struct Reconciler<'a> {
    client: &'a dyn RemoteClient,
    store: &'a SnapshotStore,
    cache_key: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn RemoteClient, store: &'a SnapshotStore, cache_key: String) -> Self {
        Self {
            client,
            store,
            cache_key,
        }
    }

    /// Current remote entries, rewritten relative to `view.base`.
    pub async fn current_remote_entries(&self, view: &RemoteView) -> Result<Vec<Entry>> {
        let snapshot = self.refresh().await?;
        Ok(project(&snapshot.files, view))
    }

    /// Bring the snapshot up to date: seed, resume a seed, or replay the
    /// change feed, then compact and persist.
    pub async fn refresh(&self) -> Result<RemoteSnapshot> {
        match self.store.load(&self.cache_key)? {
            None => {
                tracing::debug!("No snapshot cache; seeding via full traversal");
                self.seed(None).await
            }
            Some(snapshot) if snapshot.seed.is_some() => {
                tracing::debug!("Resuming interrupted seed traversal");
                self.seed(Some(snapshot)).await
            }
            Some(snapshot) => self.replay(snapshot).await,
        }
    }

    /// Drop the cache so the next refresh performs a full traversal.
    pub fn invalidate(&self) -> Result<()> {
        self.store.discard(&self.cache_key)
    }

    async fn seed(&self, resume: Option<RemoteSnapshot>) -> Result<RemoteSnapshot> {
        let mut snapshot = match resume {
            Some(snapshot) => snapshot,
            None => {
                // Capture the cursor before listing: changes racing the
                // traversal are then covered by the first delta replay.
                let origin = self.client.latest_cursor().await?;
                RemoteSnapshot::seeding(origin)
            }
        };

        loop {
            let link = snapshot.seed.as_ref().and_then(|c| c.next.clone());
            let page = self.client.list_page(link.as_deref()).await?;
            for entry in page.entries {
                snapshot.files.insert(entry.path.clone(), entry.normalized());
            }
            match page.next {
                Some(next) => {
                    snapshot.seed = Some(SeedCheckpoint { next: Some(next) });
                    // Checkpoint after every page so an interrupted seed
                    // resumes instead of restarting.
                    self.store.save(&self.cache_key, &snapshot)?;
                }
                None => {
                    snapshot.seed = None;
                    snapshot.fetched_at = chrono::Utc::now();
                    self.store.save(&self.cache_key, &snapshot)?;
                    tracing::debug!(files = snapshot.files.len(), "Seed traversal complete");
                    return Ok(snapshot);
                }
            }
        }
    }

    async fn replay(&self, mut snapshot: RemoteSnapshot) -> Result<RemoteSnapshot> {
        loop {
            let requested = snapshot.resume_cursor().to_string();
            let page = self.client.delta(&requested).await?;

            if page.reset {
                tracing::debug!("Change feed reported a history reset; re-seeding");
                self.store.discard(&self.cache_key)?;
                return self.seed(None).await;
            }

            let done = page.cursor == requested || !page.has_more;
            snapshot.deltas.push(DeltaBatch {
                cursor: page.cursor,
                entries: page.entries,
            });
            // Persist fetched batches before folding them.
            self.store.save(&self.cache_key, &snapshot)?;
            if done {
                break;
            }
        }

        // Fold and compact.
        let final_cursor = snapshot.resume_cursor().to_string();
        let mut files = snapshot.files;
        let applied: usize = snapshot.deltas.iter().map(|b| b.entries.len()).sum();
        for batch in snapshot.deltas {
            crate::delta::fold_deltas(&mut files, batch.entries);
        }
        let compacted = RemoteSnapshot {
            files,
            origin_cursor: final_cursor,
            deltas: Vec::new(),
            seed: None,
            fetched_at: chrono::Utc::now(),
        };
        self.store.save(&self.cache_key, &compacted)?;
        tracing::debug!(applied, files = compacted.files.len(), "Delta replay compacted");
        Ok(compacted)
    }
}

/// Project raw remote files into the vault namespace.
///
/// Keeps entries under `view.base`, rewrites them relative to it,
/// applies the glob filter, resynthesizes ancestor directories the
/// filter dropped ("complete-loss" directories), and marks entries that
/// sit below an excluded directory as `ignored`.
fn project(files: &BTreeMap<VaultPath, Entry>, view: &RemoteView) -> Vec<Entry> {
    let mut out: BTreeMap<VaultPath, Entry> = BTreeMap::new();

    for (path, entry) in files {
        let Some(rebased) = path.relative_to(&view.base) else {
            continue;
        };
        if rebased.is_root() {
            continue;
        }
        let under_excluded = rebased
            .ancestors()
            .iter()
            .any(|a| !a.is_root() && view.filter.is_excluded(a));
        let entry = entry.clone().with_path(rebased.clone());
        if under_excluded {
            if view.filter.check(&rebased) {
                out.insert(rebased, entry.marked_ignored());
            }
        } else if view.filter.check(&rebased) {
            out.insert(rebased, entry);
        }
    }

    // Repair ancestors of kept entries that were lost to filtering.
    let kept: Vec<VaultPath> = out
        .values()
        .filter(|e| e.is_present())
        .map(|e| e.path.clone())
        .collect();
    for path in kept {
        for ancestor in path.ancestors() {
            if !ancestor.is_root() && !out.contains_key(&ancestor) {
                out.insert(ancestor.clone(), Entry::dir(ancestor));
            }
        }
    }

    out.into_values().collect()
}
