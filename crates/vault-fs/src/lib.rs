//! Path normalization, checksums, and safe I/O for Vault Sync
//!
//! Layer-0 crate: everything above it agrees on vault-relative paths,
//! canonical checksums, and atomic persistence through this crate.

pub mod checksum;
pub mod error;
pub mod filter;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use filter::PathFilter;
pub use path::VaultPath;
