//! Cache repository backends.

mod atomic;
pub mod file;
#[cfg(feature = "backend-redis")]
pub mod redis;
