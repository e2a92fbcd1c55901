//! Local store adapter for Vault Sync
//!
//! Defines the [`LocalAdapter`] port the engine consumes and provides
//! [`LocalDirAdapter`], the on-disk implementation rooted at a directory.

pub mod adapter;
pub mod dir;
pub mod error;

pub use adapter::{LocalAdapter, Listing, walk_local};
pub use dir::LocalDirAdapter;
pub use error::{Error, Result};
