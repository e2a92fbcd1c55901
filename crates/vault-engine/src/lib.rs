//! The Vault Sync engine
//!
//! Everything between the two tree views and the wire: settings, the
//! pure decision pass that turns trees plus records into an ordered
//! task plan, line-merge conflict resolution, and the [`SyncRunner`]
//! that executes a plan sequentially with throttle retries, cooperative
//! cancellation, and interruption-safe record updates.

pub mod cancel;
pub mod decision;
pub mod error;
pub mod executor;
pub mod merge;
pub mod resolver;
pub mod settings;
pub mod task;

pub use cancel::{CancelToken, sleep_cancellable};
pub use decision::{BaseInspector, PlanWarning, SyncPlan, TrustMtime, decide};
pub use error::{Error, Result};
pub use executor::{Progress, ProgressSink, RunOptions, RunOutcome, RunReport, SyncRunner};
pub use resolver::{Resolution, Version, resolve};
pub use settings::{ConflictStrategy, EqualityMode, SyncSettings};
pub use task::{Task, TaskResult};
