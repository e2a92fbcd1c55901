//! Durable sync records and content-addressed merge bases
//!
//! The record store is the ground truth for three-way comparison: for
//! every reconciled path it remembers the last successful local and
//! remote state, plus an optional reference into the blob store holding
//! the file content at that moment (the merge ancestor).

pub mod blob;
pub mod error;
pub mod record;
pub mod store;

pub use blob::BlobStore;
pub use error::{Error, Result};
pub use record::SyncRecord;
pub use store::RecordStore;
