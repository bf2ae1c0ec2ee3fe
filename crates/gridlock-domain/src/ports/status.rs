//! Status Flag Manager Port
//!
//! Ephemeral named boolean markers signalling "an operation is currently
//! active", consumed by operational and monitoring collaborators. Flags are
//! set at the start of a tracked operation and cleared at its end; the
//! distributed implementation self-expires flags after a TTL so a crashed
//! setter leaves only bounded staleness behind.

use crate::error::Result;
use std::time::Duration;

/// Status flag manager interface
pub trait StatusManager: Send + Sync {
    /// Set the flag `name`.
    ///
    /// `ttl` bounds staleness on backends with native expiry; the file
    /// backend ignores it.
    fn set_status(&self, name: &str, ttl: Option<Duration>) -> Result<()>;

    /// Clear the flag `name`. Clearing an absent flag is a no-op.
    fn clear_status(&self, name: &str) -> Result<()>;

    /// Whether the flag `name` is currently set.
    fn is_status_set(&self, name: &str) -> Result<bool>;

    /// Clear every known flag.
    ///
    /// Administrative reset for process startup after an unclean shutdown.
    /// Does not check for active holders; never call during normal
    /// operation.
    fn clear_all(&self) -> Result<()>;

    /// Identifier of this backend implementation.
    fn backend_name(&self) -> &'static str;
}
