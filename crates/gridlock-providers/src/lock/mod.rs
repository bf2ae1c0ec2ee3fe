//! Lock manager backends.

#[cfg(feature = "backend-redis")]
pub mod redis;
pub mod thread;
