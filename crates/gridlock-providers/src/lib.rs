//! Backend Implementations
//!
//! Implementations of the `gridlock-domain` ports.
//!
//! ## Available Backends
//!
//! | Backend | Scope | Description |
//! |---------|-------|-------------|
//! | [`ThreadLockManager`] | Process | Per-resource reentrant locking for threads |
//! | [`RedisLockManager`] | Cluster | SET-NX locks with TTL and fencing tokens |
//! | [`FileCacheRepository`] | Process | Atomic temp-write-then-rename file cache |
//! | [`RedisCacheRepository`] | Cluster | Redis-native single-key cache operations |
//! | [`FileStatusManager`] | Process | Hidden marker files as status flags |
//! | [`RedisStatusManager`] | Cluster | Self-expiring Redis status flags |
//!
//! Redis backends are behind the `backend-redis` feature (on by default).
//! Backend selection happens in `gridlock-infrastructure`; nothing here
//! branches on deployment topology at call sites.

pub mod cache;
pub mod lock;
pub mod status;

#[cfg(feature = "backend-redis")]
mod redis_util;

pub use cache::file::FileCacheRepository;
pub use lock::thread::ThreadLockManager;
pub use status::file::FileStatusManager;

#[cfg(feature = "backend-redis")]
pub use cache::redis::RedisCacheRepository;
#[cfg(feature = "backend-redis")]
pub use lock::redis::RedisLockManager;
#[cfg(feature = "backend-redis")]
pub use status::redis::RedisStatusManager;
