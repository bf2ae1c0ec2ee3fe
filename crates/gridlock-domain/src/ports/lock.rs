//! Lock Manager Port
//!
//! Defines the contract for mutual exclusion over named resources. Two
//! implementations exist: a thread-level registry for single-process
//! deployments and a Redis coordinator for multi-process deployments. Both
//! hand out a [`LockLease`] whose `Drop` releases the lock on every exit
//! path from the protected scope.

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Release half of a lock backend.
///
/// Split out of [`LockManager`] so a [`LockLease`] can release itself
/// without holding the concrete manager type. Release is fenced: it only
/// takes effect if `token` still matches the stored owner token, so a stale
/// holder can never tear down a newer holder's lock.
pub trait LockReleaser: Send + Sync {
    /// Release the lock on `resource` if `token` still owns it.
    fn release(&self, resource: &str, token: &str) -> Result<()>;
}

/// Scoped handle for an acquired lock.
///
/// Dropping the lease releases the lock; release failures during drop are
/// logged, not panicked. Callers that need to observe release errors use
/// [`LockLease::release`] instead of relying on drop.
pub struct LockLease {
    resource: String,
    token: String,
    releaser: Arc<dyn LockReleaser>,
    released: bool,
}

impl LockLease {
    /// Create a lease for an acquisition. Called by backend implementations.
    pub fn new(
        resource: impl Into<String>,
        token: impl Into<String>,
        releaser: Arc<dyn LockReleaser>,
    ) -> Self {
        Self {
            resource: resource.into(),
            token: token.into(),
            releaser,
            released: false,
        }
    }

    /// The locked resource name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The fencing token unique to this acquisition.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Release the lock explicitly, surfacing any backend error.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.releaser.release(&self.resource, &self.token)
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.releaser.release(&self.resource, &self.token) {
            tracing::warn!(
                resource = %self.resource,
                error = %e,
                "failed to release lock on scope exit"
            );
        }
    }
}

impl std::fmt::Debug for LockLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockLease")
            .field("resource", &self.resource)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Lock manager interface
///
/// At most one active lock exists per resource name within the scope of the
/// chosen implementation (process for the thread backend, cluster for the
/// Redis backend). Locks on distinct resources never contend.
pub trait LockManager: Send + Sync {
    /// Acquire the lock for `resource`, waiting up to `timeout`.
    ///
    /// Blocks with bounded polling, never busy-spinning. The timeout is a
    /// hard ceiling measured from call entry, inclusive of all internal
    /// bookkeeping; when it elapses unmet the call fails with
    /// [`crate::Error::LockTimeout`]. `None` waits indefinitely.
    ///
    /// No fairness is guaranteed: concurrent waiters race to reacquire
    /// after a release.
    fn acquire(&self, resource: &str, timeout: Option<Duration>) -> Result<LockLease>;

    /// Whether `resource` is currently locked.
    ///
    /// Best-effort: the answer may be stale the moment it is returned. Use
    /// for diagnostics only, never for correctness decisions.
    fn is_locked(&self, resource: &str) -> Result<bool>;

    /// Identifier of this backend implementation.
    fn backend_name(&self) -> &'static str;
}
