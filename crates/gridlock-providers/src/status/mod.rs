//! Status flag backends.

pub mod file;
#[cfg(feature = "backend-redis")]
pub mod redis;
