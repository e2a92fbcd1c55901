//! Remote protocol client interface and state reconciler for Vault Sync
//!
//! The remote side of a sync is expensive to list in full. This crate
//! defines the opaque [`RemoteClient`] port, a persisted snapshot cache,
//! and the [`Reconciler`] that replays the server's incremental change
//! feed against the cache so each run only pays for the delta since the
//! last one. A shared [`RateLimiter`] keeps every remote call under the
//! provider's throttling thresholds.

pub mod client;
pub mod delta;
pub mod error;
pub mod limiter;
pub mod reconciler;
pub mod snapshot;

pub use client::{DeltaPage, ListPage, RemoteClient};
pub use delta::DeltaEntry;
pub use error::{Error, Result};
pub use limiter::{RateLimiter, ThrottledClient};
pub use reconciler::{Reconciler, RemoteView};
pub use snapshot::{DeltaBatch, RemoteSnapshot, SeedCheckpoint, SnapshotStore};
