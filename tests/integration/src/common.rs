//! Shared harness: a full sync runner over in-memory sides.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use vault_engine::{CancelToken, RunOptions, RunReport, SyncRunner, SyncSettings};
use vault_remote::{RateLimiter, RemoteClient, SnapshotStore, ThrottledClient};
use vault_store::{BlobStore, RecordStore};
use vault_test_utils::{MemoryVault, MockRemote};

pub struct Harness {
    pub local: Arc<MemoryVault>,
    pub remote: Arc<MockRemote>,
    pub runner: SyncRunner,
    _stores: TempDir,
}

pub fn harness(settings: SyncSettings) -> Harness {
    // Only the first call installs a subscriber; later calls are no-ops.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .compact()
        .try_init();

    let stores = TempDir::new().unwrap();
    let local = Arc::new(MemoryVault::new());
    let remote = Arc::new(MockRemote::new());
    // Same wiring as production: every remote call goes through the
    // shared rate limiter. A zero gap keeps paused-clock tests exact.
    let throttled: Arc<dyn RemoteClient> = Arc::new(ThrottledClient::new(
        Arc::clone(&remote) as Arc<dyn RemoteClient>,
        RateLimiter::new(4, Duration::ZERO),
    ));
    let runner = SyncRunner::new(
        local.clone(),
        throttled,
        RecordStore::open(stores.path().join("records")),
        BlobStore::open(stores.path().join("blobs")),
        SnapshotStore::open(stores.path().join("snapshots")),
        settings,
    );
    Harness {
        local,
        remote,
        runner,
        _stores: stores,
    }
}

impl Harness {
    pub async fn run(&self) -> RunReport {
        self.runner.run(&RunOptions::default()).await.unwrap()
    }

    pub async fn assert_settled(&self) {
        let plan = self.runner.plan(&CancelToken::new()).await.unwrap();
        assert!(
            plan.is_settled(),
            "expected a settled plan, got {:?}",
            plan.tasks
        );
    }
}
