//! Redis lock coordinator
//!
//! Distributed mutual exclusion for multi-process and multi-host
//! deployments, based on the Redis SET-NX pattern:
//! <https://redis.io/docs/manual/patterns/distributed-locks/>
//!
//! Acquisition performs a conditional `SET key token NX PX ttl` with a
//! freshly generated UUID token; contended acquisition polls at a bounded
//! interval. Release runs an atomic check-and-delete script that only
//! succeeds while the stored token still equals the caller's, so a delayed
//! release from an expired holder can never delete a later holder's lock.
//!
//! Losing connectivity to the store is surfaced as
//! [`Error::LockBackendUnavailable`], never treated as "resource is free".
//!
//! Known gap, deliberate: there is no renewal or heartbeat. A critical
//! section that outlives the lock TTL loses exclusivity silently while it
//! keeps running. Size the TTL above the worst-case critical section.

use crate::redis_util;
use gridlock_domain::error::{Error, Result};
use gridlock_domain::keys::StoreKey;
use gridlock_domain::ports::lock::{LockLease, LockManager, LockReleaser};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Interval between SET-NX attempts while the lock is contended.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Key kind for lock entries in the shared store.
const KEY_KIND: &str = "lock";

/// Atomic check-and-delete: delete the key only while it still holds the
/// caller's token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

struct RedisLockInner {
    client: redis::Client,
    key_prefix: String,
}

impl RedisLockInner {
    fn lock_key(&self, resource: &str) -> String {
        StoreKey::namespaced(&self.key_prefix, KEY_KIND, resource)
    }

    fn connection(&self) -> Result<redis::Connection> {
        self.client
            .get_connection()
            .map_err(|e| Error::lock_backend("failed to connect to Redis", e))
    }
}

impl LockReleaser for RedisLockInner {
    fn release(&self, resource: &str, token: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let deleted: i32 = redis::Script::new(RELEASE_SCRIPT)
            .key(self.lock_key(resource))
            .arg(token)
            .invoke(&mut conn)
            .map_err(|e| Error::lock_backend("Redis lock release failed", e))?;

        if deleted == 1 {
            tracing::debug!(resource, "redis lock released");
        } else {
            // Expired, or already reacquired by a later owner. The fencing
            // check kept that owner's lock intact.
            tracing::warn!(resource, "lock already released or expired");
        }
        Ok(())
    }
}

/// Distributed lock manager backed by Redis.
///
/// Locks auto-expire after a TTL so a crashed holder cannot leave a stuck
/// lock behind.
pub struct RedisLockManager {
    inner: Arc<RedisLockInner>,
    default_ttl: Duration,
    poll_interval: Duration,
}

impl RedisLockManager {
    /// Connect to Redis and verify the connection with a PING.
    ///
    /// Fails fast on an unparsable URL ([`Error::Configuration`]) or an
    /// unreachable store ([`Error::LockBackendUnavailable`]); the caller
    /// never gets a manager that silently degrades.
    pub fn new(url: &str, key_prefix: impl Into<String>, default_ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Configuration {
            message: format!("invalid Redis URL '{}'", url),
            source: Some(Box::new(e)),
        })?;

        let inner = Arc::new(RedisLockInner {
            client,
            key_prefix: key_prefix.into(),
        });

        let mut conn = inner.connection()?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| Error::lock_backend("Redis ping failed", e))?;

        tracing::info!(key_prefix = %inner.key_prefix, "redis lock manager initialized");

        Ok(Self {
            inner,
            default_ttl,
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Override the polling interval. Intended for tests.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Acquire with an explicit TTL instead of the manager default.
    ///
    /// The lock is not renewed while held: a critical section running
    /// longer than `ttl` silently loses exclusivity to the next caller.
    pub fn acquire_with_ttl(
        &self,
        resource: &str,
        timeout: Option<Duration>,
        ttl: Duration,
    ) -> Result<LockLease> {
        let start = Instant::now();
        let key = self.inner.lock_key(resource);
        let token = Uuid::new_v4().to_string();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut conn = self.inner.connection()?;

        loop {
            // SET key token NX PX ttl - set only if absent, with expiry.
            let reply: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query(&mut conn)
                .map_err(|e| Error::lock_backend("Redis SET NX failed", e))?;

            if reply.is_some() {
                tracing::debug!(resource, waited = ?start.elapsed(), "redis lock acquired");
                return Ok(LockLease::new(
                    resource,
                    token,
                    self.inner.clone() as Arc<dyn LockReleaser>,
                ));
            }

            match timeout {
                Some(limit) if start.elapsed() >= limit => {
                    tracing::error!(resource, waited = ?start.elapsed(), "timeout acquiring redis lock");
                    return Err(Error::LockTimeout {
                        resource: resource.to_string(),
                        waited: start.elapsed(),
                    });
                }
                Some(limit) => {
                    let remaining = limit.saturating_sub(start.elapsed());
                    thread::sleep(self.poll_interval.min(remaining));
                }
                None => thread::sleep(self.poll_interval),
            }
        }
    }

    /// Remaining TTL of the lock on `resource`, `None` when no lock exists.
    pub fn get_ttl(&self, resource: &str) -> Result<Option<Duration>> {
        let mut conn = self.inner.connection()?;
        let ttl_ms: i64 = redis::cmd("PTTL")
            .arg(self.inner.lock_key(resource))
            .query(&mut conn)
            .map_err(|e| Error::lock_backend("Redis PTTL failed", e))?;

        // -2 = key absent, -1 = no expiry set.
        if ttl_ms > 0 {
            Ok(Some(Duration::from_millis(ttl_ms.unsigned_abs())))
        } else {
            Ok(None)
        }
    }

    /// Delete the lock on `resource` regardless of owner.
    ///
    /// Administrative cleanup only: this bypasses the fencing check.
    pub fn force_release(&self, resource: &str) -> Result<()> {
        let mut conn = self.inner.connection()?;
        let deleted: i32 = redis::cmd("DEL")
            .arg(self.inner.lock_key(resource))
            .query(&mut conn)
            .map_err(|e| Error::lock_backend("Redis DEL failed", e))?;

        if deleted > 0 {
            tracing::warn!(resource, "force released lock");
        } else {
            tracing::debug!(resource, "no lock to force release");
        }
        Ok(())
    }

    /// Delete every lock under this manager's prefix.
    ///
    /// Administrative cleanup only; enumerates with SCAN to avoid stalling
    /// the store.
    pub fn clear_all(&self) -> Result<()> {
        let mut conn = self.inner.connection()?;
        let pattern = StoreKey::namespaced(&self.inner.key_prefix, KEY_KIND, "*");
        let deleted = redis_util::delete_matching(&mut conn, &pattern)
            .map_err(|e| Error::lock_backend("Redis lock clear failed", e))?;
        if deleted > 0 {
            tracing::warn!(deleted, "cleared locks");
        }
        Ok(())
    }
}

impl LockManager for RedisLockManager {
    fn acquire(&self, resource: &str, timeout: Option<Duration>) -> Result<LockLease> {
        self.acquire_with_ttl(resource, timeout, self.default_ttl)
    }

    fn is_locked(&self, resource: &str) -> Result<bool> {
        let mut conn = self.inner.connection()?;
        let exists: i32 = redis::cmd("EXISTS")
            .arg(self.inner.lock_key(resource))
            .query(&mut conn)
            .map_err(|e| Error::lock_backend("Redis EXISTS failed", e))?;
        Ok(exists > 0)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisLockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLockManager")
            .field("key_prefix", &self.inner.key_prefix)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
