//! Port traits implemented by the interchangeable backends.

pub mod cache;
pub mod lock;
pub mod status;
