//! Run mechanics: throttle retries, cancellation, progress, and the
//! incremental change-feed refresh.

mod common;

use std::sync::Mutex;

use common::harness;
use pretty_assertions::assert_eq;
use vault_engine::{
    CancelToken, Error, Progress, ProgressSink, RunOptions, RunOutcome, SyncSettings,
};

#[tokio::test]
async fn second_run_refreshes_from_the_change_feed_not_a_full_listing() {
    let h = harness(SyncSettings::default());
    h.remote.put("/a.md", "one\n", 100);
    h.run().await;

    h.remote.put("/b.md", "two\n", 200);
    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert!(h.local.contains("/b.md"));
    // Only the first run paid for a traversal.
    assert_eq!(h.remote.list_calls(), 1);
    assert!(h.remote.delta_calls() >= 1);
}

#[tokio::test]
async fn feed_reset_falls_back_to_a_fresh_traversal() {
    let h = harness(SyncSettings::default());
    h.remote.put("/a.md", "one\n", 100);
    h.run().await;

    h.remote.put("/b.md", "two\n", 200);
    h.remote.force_reset();
    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert!(h.local.contains("/b.md"));
    assert_eq!(h.remote.list_calls(), 2);
}

#[tokio::test]
async fn paginated_seed_traversal_sees_every_entry() {
    let stores = tempfile::TempDir::new().unwrap();
    let local = std::sync::Arc::new(vault_test_utils::MemoryVault::new());
    let remote = std::sync::Arc::new(vault_test_utils::MockRemote::new().with_page_sizes(2, 2));
    let runner = vault_engine::SyncRunner::new(
        local.clone(),
        remote.clone(),
        vault_store::RecordStore::open(stores.path().join("records")),
        vault_store::BlobStore::open(stores.path().join("blobs")),
        vault_remote::SnapshotStore::open(stores.path().join("snapshots")),
        SyncSettings::default(),
    );
    for i in 0..7 {
        remote.put(&format!("/n{i}.md"), "x\n", 100 + i);
    }

    let report = runner.run(&RunOptions::default()).await.unwrap();
    assert_eq!(report.failed(), 0);
    for i in 0..7 {
        assert!(local.contains(&format!("/n{i}.md")));
    }
    assert!(remote.list_calls() > 1);
}

#[tokio::test(start_paused = true)]
async fn throttled_tasks_retry_until_they_succeed() {
    let h = harness(SyncSettings::default());
    h.local.put("/a.md", "content\n", 100);
    h.remote.throttle_next(3);

    let report = h.run().await;
    assert_eq!(report.failed(), 0, "results: {:?}", report.results);
    assert_eq!(h.remote.content("/a.md").unwrap(), b"content\n");
}

#[tokio::test(start_paused = true)]
async fn cancelling_during_a_throttle_wait_unblocks_the_run() {
    let h = harness(SyncSettings::default());
    h.local.put("/a.md", "content\n", 100);
    // Throttle everything so the run can only sit in retry waits.
    h.remote.throttle_next(usize::MAX);

    let cancel = CancelToken::new();
    let options = RunOptions {
        cancel: cancel.clone(),
        ..RunOptions::default()
    };
    let run = h.runner.run(&options);
    tokio::pin!(run);

    // Let the run reach its first wait, then cancel.
    let raced = tokio::select! {
        outcome = &mut run => Some(outcome),
        _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => None,
    };
    assert!(raced.is_none(), "run finished before cancellation");
    cancel.cancel();
    let outcome = run.await;
    assert!(matches!(outcome, Err(Error::Cancelled)));
}

#[tokio::test]
async fn rejected_confirmation_cancels_the_run_untouched() {
    let h = harness(SyncSettings::default());
    h.local.put("/a.md", "content\n", 100);

    let reject = |_: &vault_engine::SyncPlan| false;
    let options = RunOptions {
        confirm: Some(&reject),
        ..RunOptions::default()
    };
    let report = h.runner.run(&options).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.results.is_empty());
    assert!(!h.remote.contains("/a.md"));
}

struct CollectProgress(Mutex<Vec<(usize, usize)>>);

impl ProgressSink for CollectProgress {
    fn on_progress(&self, progress: &Progress<'_>) {
        self.0
            .lock()
            .unwrap()
            .push((progress.total, progress.completed.len()));
    }
}

#[tokio::test]
async fn progress_is_reported_after_every_task() {
    let h = harness(SyncSettings::default());
    h.local.put("/a.md", "one\n", 100);
    h.local.put("/b.md", "two\n", 100);
    h.remote.put("/c.md", "three\n", 100);

    let sink = CollectProgress(Mutex::new(Vec::new()));
    let options = RunOptions {
        progress: Some(&sink),
        ..RunOptions::default()
    };
    let report = h.runner.run(&options).await.unwrap();
    assert_eq!(report.failed(), 0);

    let seen = sink.0.into_inner().unwrap();
    let total = report.results.len();
    let expected: Vec<(usize, usize)> = (1..=total).map(|done| (total, done)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn interrupted_runs_keep_records_for_completed_work_only() {
    let h = harness(SyncSettings::default());
    h.local.put("/a.md", "one\n", 100);
    h.run().await;

    // A failing conflict leaves its record alone while the rest of the
    // run still records normally.
    h.local.put("/a.md", "y\n", 200);
    h.remote.put("/a.md", "z\n", 9_000);
    h.local.put("/b.md", "new\n", 300);

    let report = h.run().await;
    assert_eq!(report.failed(), 1);
    assert!(h.remote.contains("/b.md"));

    // The conflict is still on the next plan; /b.md is settled.
    let plan = h.runner.plan(&CancelToken::new()).await.unwrap();
    let pending: Vec<String> = plan
        .tasks
        .iter()
        .filter(|t| !t.is_inert())
        .map(|t| t.path().to_string())
        .collect();
    assert_eq!(pending, vec!["/a.md".to_string()]);
}
