//! # gridlock-domain
//!
//! Core contracts for the gridlock coordination subsystem: the error
//! taxonomy, the port traits implemented by the interchangeable local and
//! distributed backends, and the key helpers shared by every backend.
//!
//! The three ports are:
//!
//! - [`LockManager`] - mutual exclusion over named resources, with scoped
//!   release via [`LockLease`]
//! - [`CacheRepository`] - atomic get/set/exists/delete over serialized
//!   payloads, wrapped by [`SharedCache`] for typed access
//! - [`StatusManager`] - ephemeral named markers signalling that an
//!   operation is currently active
//!
//! Implementations live in `gridlock-providers`; backend selection happens
//! in `gridlock-infrastructure` at construction time.

pub mod error;
pub mod keys;
pub mod ports;

pub use error::{Error, Result};
pub use keys::StoreKey;
pub use ports::cache::{CacheRepository, SharedCache};
pub use ports::lock::{LockLease, LockManager, LockReleaser};
pub use ports::status::StatusManager;
