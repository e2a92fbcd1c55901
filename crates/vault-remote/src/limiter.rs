//! Shared rate limiting for all remote calls
//!
//! Providers throttle aggressively; every remote call from any component
//! passes through one [`RateLimiter`] that bounds concurrency and
//! enforces a minimum spacing between call starts. [`ThrottledClient`]
//! wraps any [`RemoteClient`] so call sites cannot forget the limiter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use vault_fs::VaultPath;
use vault_tree::Entry;

use crate::{DeltaPage, ListPage, RemoteClient, Result};

#[derive(Debug)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    min_gap: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_gap: Duration) -> Arc<Self> {
        Arc::new(Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_gap,
            last_start: Mutex::new(None),
        })
    }

    /// Wait for a concurrency slot and the inter-call gap.
    ///
    /// The returned permit must be held for the duration of the call.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        // The semaphore is never closed; `ok()` avoids a panic path.
        let permit = self.permits.clone().acquire_owned().await.ok();
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
        permit
    }
}

/// A [`RemoteClient`] wrapper that funnels every call through a shared
/// [`RateLimiter`].
pub struct ThrottledClient<C> {
    inner: C,
    limiter: Arc<RateLimiter>,
}

impl<C> ThrottledClient<C> {
    pub fn new(inner: C, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<C: RemoteClient> RemoteClient for ThrottledClient<C> {
    async fn list_page(&self, link: Option<&str>) -> Result<ListPage> {
        let _permit = self.limiter.acquire().await;
        self.inner.list_page(link).await
    }

    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>> {
        let _permit = self.limiter.acquire().await;
        self.inner.stat(path).await
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        let _permit = self.limiter.acquire().await;
        self.inner.read(path).await
    }

    async fn write(&self, path: &VaultPath, bytes: &[u8], overwrite: bool) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.write(path, bytes, overwrite).await
    }

    async fn mkdir(&self, path: &VaultPath, recursive: bool) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.mkdir(path, recursive).await
    }

    async fn delete(&self, path: &VaultPath) -> Result<()> {
        let _permit = self.limiter.acquire().await;
        self.inner.delete(path).await
    }

    async fn latest_cursor(&self) -> Result<String> {
        let _permit = self.limiter.acquire().await;
        self.inner.latest_cursor().await
    }

    async fn delta(&self, cursor: &str) -> Result<DeltaPage> {
        let _permit = self.limiter.acquire().await;
        self.inner.delta(cursor).await
    }
}
