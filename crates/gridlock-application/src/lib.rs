//! Application Use Cases
//!
//! Collaborator-facing workflows built on the `gridlock-domain` cache
//! port. Nothing here knows which backend serves the cache; the
//! infrastructure layer wires that in at construction time.

pub mod use_cases;

pub use use_cases::history::{HISTORY_DEPTH, ReadingHistory};
pub use use_cases::last_update::LastUpdateTracker;
