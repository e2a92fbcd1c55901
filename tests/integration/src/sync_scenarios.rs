//! End-to-end reconciliation scenarios over in-memory sides.

mod common;

use common::harness;
use pretty_assertions::assert_eq;
use vault_engine::SyncSettings;

#[tokio::test]
async fn first_sync_converges_both_sides() {
    let h = harness(SyncSettings::default());
    h.local.put("/local.md", "from local\n", 100);
    h.remote.put("/notes/remote.md", "from remote\n", 200);

    let report = h.run().await;
    assert_eq!(report.failed(), 0, "results: {:?}", report.results);

    assert_eq!(h.remote.content("/local.md").unwrap(), b"from local\n");
    assert_eq!(
        h.local.content("/notes/remote.md").unwrap(),
        b"from remote\n"
    );
    // The pulled file's parent folder materialized locally.
    assert!(h.local.contains("/notes"));

    // With records written, the next run has nothing to do.
    h.assert_settled().await;
}

#[tokio::test]
async fn one_sided_edit_propagates() {
    let h = harness(SyncSettings::default());
    h.local.put("/doc.md", "v1\n", 100);
    h.run().await;

    h.local.put("/doc.md", "v2\n", 200);
    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert_eq!(h.remote.content("/doc.md").unwrap(), b"v2\n");
    h.assert_settled().await;
}

#[tokio::test]
async fn remote_edit_overwrites_unchanged_local() {
    let h = harness(SyncSettings::default());
    h.local.put("/doc.md", "v1\n", 100);
    h.run().await;

    h.remote.put("/doc.md", "v2 from elsewhere\n", 9_000);
    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert_eq!(h.local.content("/doc.md").unwrap(), b"v2 from elsewhere\n");
}

#[tokio::test]
async fn concurrent_disjoint_edits_merge_on_both_sides() {
    let h = harness(SyncSettings::default());
    h.local.put("/doc.md", "line1\nline2\n", 100);
    h.run().await;

    // Local appends; the other device rewrites the first line.
    h.local.put("/doc.md", "line1\nline2\nline3\n", 200);
    h.remote.put("/doc.md", "LINE1\nline2\n", 9_000);

    let report = h.run().await;
    assert_eq!(report.failed(), 0, "results: {:?}", report.results);
    let merged = b"LINE1\nline2\nline3\n".to_vec();
    assert_eq!(h.local.content("/doc.md").unwrap(), merged);
    assert_eq!(h.remote.content("/doc.md").unwrap(), merged);
    h.assert_settled().await;
}

#[tokio::test]
async fn unmergeable_conflict_fails_and_touches_nothing() {
    let h = harness(SyncSettings::default());
    h.local.put("/doc.md", "x\n", 100);
    h.run().await;

    h.local.put("/doc.md", "y\n", 200);
    h.remote.put("/doc.md", "z\n", 9_000);

    let report = h.run().await;
    assert_eq!(report.failed(), 1);
    // Both sides keep their divergent content for the user to resolve.
    assert_eq!(h.local.content("/doc.md").unwrap(), b"y\n");
    assert_eq!(h.remote.content("/doc.md").unwrap(), b"z\n");
}

#[tokio::test]
async fn unmergeable_conflict_with_markers_writes_the_document_to_both_sides() {
    let h = harness(SyncSettings {
        conflict_markers: true,
        ..SyncSettings::default()
    });
    h.local.put("/doc.md", "x\n", 100);
    h.run().await;

    h.local.put("/doc.md", "y\n", 200);
    h.remote.put("/doc.md", "z\n", 9_000);

    let report = h.run().await;
    assert_eq!(report.failed(), 0, "results: {:?}", report.results);
    let doc = String::from_utf8(h.local.content("/doc.md").unwrap()).unwrap();
    assert!(doc.contains("<<<<<<< local\ny\n"), "doc: {doc}");
    assert!(doc.contains("=======\nz\n>>>>>>> remote"), "doc: {doc}");
    assert_eq!(h.remote.content("/doc.md").unwrap(), doc.as_bytes());
}

#[tokio::test]
async fn latest_timestamp_strategy_lets_the_newer_side_win() {
    let h = harness(SyncSettings {
        strategy: vault_engine::ConflictStrategy::LatestTimestamp,
        ..SyncSettings::default()
    });
    h.local.put("/doc.md", "x\n", 100);
    h.run().await;

    h.remote.put("/doc.md", "remote wins\n", 50_000);
    h.local.put("/doc.md", "older local\n", 200);

    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert_eq!(h.local.content("/doc.md").unwrap(), b"remote wins\n");
}

#[tokio::test]
async fn local_deletion_propagates_to_the_remote() {
    let h = harness(SyncSettings::default());
    h.local.put("/doomed.md", "bye\n", 100);
    h.run().await;
    assert!(h.remote.contains("/doomed.md"));

    h.local.delete_path("/doomed.md");
    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert!(!h.remote.contains("/doomed.md"));
    h.assert_settled().await;
}

#[tokio::test]
async fn remote_deletion_propagates_locally_via_the_change_feed() {
    let h = harness(SyncSettings::default());
    h.remote.put("/doomed.md", "bye\n", 100);
    h.run().await;
    assert!(h.local.contains("/doomed.md"));

    h.remote.delete_path("/doomed.md");
    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert!(!h.local.contains("/doomed.md"));
}

#[tokio::test]
async fn local_edit_resurrects_a_remotely_deleted_file() {
    let h = harness(SyncSettings::default());
    h.local.put("/keep.md", "v1\n", 100);
    h.run().await;

    h.remote.delete_path("/keep.md");
    h.local.put("/keep.md", "v2 still needed\n", 200);

    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert_eq!(h.remote.content("/keep.md").unwrap(), b"v2 still needed\n");
}

#[tokio::test]
async fn excluded_paths_never_cross_sides() {
    let h = harness(SyncSettings {
        exclude: vec!["private".to_string(), "private/**".to_string()],
        ..SyncSettings::default()
    });
    h.local.put("/private/secret.md", "hidden\n", 100);
    h.local.put("/open.md", "visible\n", 100);
    h.remote.put("/private/theirs.md", "also hidden\n", 200);

    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert!(h.remote.contains("/open.md"));
    assert!(!h.remote.contains("/private/secret.md"));
    assert!(!h.local.contains("/private/theirs.md"));
}

#[tokio::test]
async fn oversized_files_are_skipped_with_a_warning() {
    let h = harness(SyncSettings {
        max_file_size: Some(4),
        ..SyncSettings::default()
    });
    h.local.put("/big.md", "way too large\n", 100);

    let report = h.run().await;
    assert_eq!(report.results.len(), 0);
    assert_eq!(report.warnings.len(), 1);
    assert!(!h.remote.contains("/big.md"));
}

#[tokio::test]
async fn forbidden_filenames_fail_their_task_only() {
    let h = harness(SyncSettings::default());
    h.local.put("/bad:name.md", "nope\n", 100);
    h.local.put("/fine.md", "ok\n", 100);

    let report = h.run().await;
    assert_eq!(report.failed(), 1);
    assert!(h.remote.contains("/fine.md"));
    assert!(!h.remote.contains("/bad:name.md"));
    let failure = report.results.iter().find(|r| !r.success).unwrap();
    assert!(failure.error.as_ref().unwrap().contains("forbidden"));
}

#[tokio::test]
async fn vault_lives_under_the_configured_remote_base() {
    let h = harness(SyncSettings {
        remote_base: vault_fs::VaultPath::new("/apps/vault"),
        ..SyncSettings::default()
    });
    h.remote.put("/apps/vault/theirs.md", "remote\n", 100);
    h.remote.put("/elsewhere/outside.md", "invisible\n", 100);
    h.local.put("/mine.md", "local\n", 100);

    let report = h.run().await;
    assert_eq!(report.failed(), 0, "results: {:?}", report.results);
    assert_eq!(h.local.content("/theirs.md").unwrap(), b"remote\n");
    assert_eq!(h.remote.content("/apps/vault/mine.md").unwrap(), b"local\n");
    // Paths outside the base dir are invisible.
    assert!(!h.local.contains("/outside.md"));
}

#[tokio::test]
async fn missing_remote_base_is_created_before_anything_else() {
    let h = harness(SyncSettings {
        remote_base: vault_fs::VaultPath::new("/fresh"),
        ..SyncSettings::default()
    });
    h.local.put("/a.md", "content\n", 100);

    let report = h.run().await;
    assert_eq!(report.failed(), 0);
    assert!(h.remote.contains("/fresh"));
    assert!(h.remote.contains("/fresh/a.md"));
}
