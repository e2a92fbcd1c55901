//! Entry model and virtual tree projection for Vault Sync
//!
//! This crate is pure data: the canonical [`Entry`] stat model and the
//! in-memory [`VirtualTree`] projection built from a flat entry list.
//! No I/O happens here.

pub mod entry;
pub mod error;
pub mod tree;

pub use entry::Entry;
pub use error::{Error, Result};
pub use tree::VirtualTree;
