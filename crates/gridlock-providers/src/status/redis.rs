//! Redis status manager
//!
//! Flags are prefix-namespaced keys holding `"1"`, self-expiring after a
//! TTL so a crashed setter leaves at most one TTL window of staleness.
//! Status flags feed operational decisions, so unlike the cache read path
//! every operation here surfaces backend failures instead of degrading.

use crate::redis_util;
use gridlock_domain::error::{Error, Result};
use gridlock_domain::keys::StoreKey;
use gridlock_domain::ports::status::StatusManager;
use redis::Commands;
use std::time::Duration;

/// Key kind for status flags in the shared store.
const KEY_KIND: &str = "status";

/// Staleness bound applied when a set carries no explicit TTL.
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Status manager backed by Redis with self-expiring flags.
pub struct RedisStatusManager {
    client: redis::Client,
    key_prefix: String,
    default_ttl: Duration,
}

impl RedisStatusManager {
    /// Connect to Redis and verify the connection with a PING.
    pub fn new(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Configuration {
            message: format!("invalid Redis URL '{}'", url),
            source: Some(Box::new(e)),
        })?;

        let manager = Self {
            client,
            key_prefix: key_prefix.into(),
            default_ttl: DEFAULT_TTL,
        };

        let mut conn = manager.connection()?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| Error::status_backend("Redis ping failed", e))?;

        tracing::info!(key_prefix = %manager.key_prefix, "redis status manager initialized");
        Ok(manager)
    }

    /// Override the default flag TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn status_key(&self, name: &str) -> String {
        StoreKey::namespaced(&self.key_prefix, KEY_KIND, name)
    }

    fn connection(&self) -> Result<redis::Connection> {
        self.client
            .get_connection()
            .map_err(|e| Error::status_backend("failed to connect to Redis", e))
    }
}

impl StatusManager for RedisStatusManager {
    fn set_status(&self, name: &str, ttl: Option<Duration>) -> Result<()> {
        StoreKey::validate(name)?;

        let mut conn = self.connection()?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.status_key(name), "1", secs)
            .map_err(|e| {
                Error::status_backend(format!("failed to set status flag '{}'", name), e)
            })?;

        tracing::debug!(flag = name, ttl_secs = secs, "status flag set");
        Ok(())
    }

    fn clear_status(&self, name: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.del::<_, ()>(self.status_key(name)).map_err(|e| {
            Error::status_backend(format!("failed to clear status flag '{}'", name), e)
        })?;
        tracing::debug!(flag = name, "status flag cleared");
        Ok(())
    }

    fn is_status_set(&self, name: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        conn.exists::<_, bool>(self.status_key(name)).map_err(|e| {
            Error::status_backend(format!("failed to check status flag '{}'", name), e)
        })
    }

    fn clear_all(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let pattern = StoreKey::namespaced(&self.key_prefix, KEY_KIND, "*");
        let deleted = redis_util::delete_matching(&mut conn, &pattern)
            .map_err(|e| Error::status_backend("Redis status clear failed", e))?;
        if deleted > 0 {
            tracing::info!(deleted, "status flags reset");
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisStatusManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStatusManager")
            .field("key_prefix", &self.key_prefix)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
