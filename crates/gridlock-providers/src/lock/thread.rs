//! Thread lock manager
//!
//! Per-resource reentrant locking for single-process, multi-threaded
//! deployments. Each resource name maps to a lazily created lock record;
//! the map itself is guarded by one registry mutex written only on lazy
//! creation, so locks on unrelated resources never contend with each
//! other.
//!
//! Reentrancy is implemented with an explicit owner-thread marker and a
//! token stack on the lock record rather than a native reentrant
//! primitive: the same thread may re-enter a lock it already holds, and
//! the record returns to `UNLOCKED` only when every nested lease has been
//! released.

use gridlock_domain::error::{Error, Result};
use gridlock_domain::ports::lock::{LockLease, LockManager, LockReleaser};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Interval between acquisition attempts while waiting for a held lock.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// State of one named lock.
#[derive(Default)]
struct LockRecord {
    /// Thread currently holding the lock, if any.
    owner: Option<ThreadId>,
    /// Fencing tokens of the nested acquisitions, outermost first.
    /// The stack length is the reentrancy depth.
    tokens: Vec<String>,
}

/// Shared registry of lock records, keyed by resource name.
///
/// Grows with the number of distinct ever-seen resource names; entries are
/// only removed by the administrative [`ThreadLockManager::clear`].
#[derive(Default)]
struct LockRegistry {
    records: Mutex<HashMap<String, Arc<Mutex<LockRecord>>>>,
}

impl LockRegistry {
    /// Get or lazily create the record for `resource`.
    fn record_for(&self, resource: &str) -> Arc<Mutex<LockRecord>> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        records
            .entry(resource.to_string())
            .or_insert_with(|| {
                tracing::debug!(resource, "created lock record");
                Arc::new(Mutex::new(LockRecord::default()))
            })
            .clone()
    }

    /// Look up the record for `resource` without creating it.
    fn existing_record(&self, resource: &str) -> Option<Arc<Mutex<LockRecord>>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource)
            .cloned()
    }
}

impl LockReleaser for LockRegistry {
    fn release(&self, resource: &str, token: &str) -> Result<()> {
        let Some(record) = self.existing_record(resource) else {
            tracing::warn!(resource, "release for unknown resource ignored");
            return Ok(());
        };

        let mut state = record.lock().unwrap_or_else(PoisonError::into_inner);

        if state.owner != Some(thread::current().id()) {
            tracing::warn!(resource, "release from non-owning thread ignored");
            return Ok(());
        }

        match state.tokens.iter().position(|t| t == token) {
            Some(pos) => {
                state.tokens.remove(pos);
                if state.tokens.is_empty() {
                    state.owner = None;
                }
                tracing::debug!(resource, "lock released");
                Ok(())
            }
            None => {
                tracing::warn!(resource, "stale release token ignored");
                Ok(())
            }
        }
    }
}

/// Thread-level lock manager.
///
/// Suitable for single-process multi-threaded deployments; for
/// multi-process coordination use the Redis backend instead.
pub struct ThreadLockManager {
    registry: Arc<LockRegistry>,
    poll_interval: Duration,
}

impl ThreadLockManager {
    /// Create an empty lock manager.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(LockRegistry::default()),
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the polling interval. Intended for tests.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Number of distinct resource names ever locked.
    pub fn tracked_resources(&self) -> usize {
        self.registry
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every lock record.
    ///
    /// Administrative reset: the caller must guarantee no lease is live,
    /// this is not checked internally. A lease surviving a clear releases
    /// against a record that is no longer registered and is ignored.
    pub fn clear(&self) {
        let mut records = self
            .registry
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let count = records.len();
        records.clear();
        tracing::debug!(count, "cleared lock records");
    }
}

impl Default for ThreadLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for ThreadLockManager {
    fn acquire(&self, resource: &str, timeout: Option<Duration>) -> Result<LockLease> {
        let start = Instant::now();
        let record = self.registry.record_for(resource);
        let me = thread::current().id();
        let token = Uuid::new_v4().to_string();

        loop {
            {
                let mut state = record.lock().unwrap_or_else(PoisonError::into_inner);
                if state.owner.is_none() || state.owner == Some(me) {
                    state.owner = Some(me);
                    state.tokens.push(token.clone());
                    tracing::debug!(resource, waited = ?start.elapsed(), "lock acquired");
                    return Ok(LockLease::new(
                        resource,
                        token,
                        self.registry.clone() as Arc<dyn LockReleaser>,
                    ));
                }
            }

            match timeout {
                Some(limit) if start.elapsed() >= limit => {
                    tracing::error!(resource, waited = ?start.elapsed(), "timeout acquiring lock");
                    return Err(Error::LockTimeout {
                        resource: resource.to_string(),
                        waited: start.elapsed(),
                    });
                }
                Some(limit) => {
                    // Never sleep past the caller's deadline.
                    let remaining = limit.saturating_sub(start.elapsed());
                    thread::sleep(self.poll_interval.min(remaining));
                }
                None => thread::sleep(self.poll_interval),
            }
        }
    }

    fn is_locked(&self, resource: &str) -> Result<bool> {
        let Some(record) = self.registry.existing_record(resource) else {
            return Ok(false);
        };
        let state = record.lock().unwrap_or_else(PoisonError::into_inner);
        // The holding thread could re-enter, so from its perspective the
        // resource is not blocked. Mirrors reentrant semantics.
        Ok(state.owner.is_some() && state.owner != Some(thread::current().id()))
    }

    fn backend_name(&self) -> &'static str {
        "thread"
    }
}
