//! Shared test fixtures for the vault-sync workspace
//!
//! In-memory stand-ins for both sides of a sync: a [`MemoryVault`]
//! behind the local adapter port and a [`MockRemote`] behind the remote
//! client port, complete with a change feed, pagination, and throttle
//! injection. Dev-dependency only, never published.

pub mod memory;
pub mod mock_remote;

pub use memory::MemoryVault;
pub use mock_remote::MockRemote;
