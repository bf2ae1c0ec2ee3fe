//! Use case implementations.

pub mod history;
pub mod last_update;
