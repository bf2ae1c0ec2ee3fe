//! Redis cache repository
//!
//! Shared cache for multi-process and multi-host deployments. Entries are
//! JSON strings under prefix-namespaced keys, optionally expiring after a
//! TTL. Atomicity of an individual write comes from Redis itself: a SET is
//! indivisible, so readers never observe a partial payload.
//!
//! Read-path failures degrade to a logged miss so a flaky store cannot
//! take consumers down; write and delete failures propagate, since a
//! silently dropped write would leave callers trusting state that was
//! never stored.

use crate::redis_util;
use gridlock_domain::error::{Error, Result};
use gridlock_domain::keys::StoreKey;
use gridlock_domain::ports::cache::CacheRepository;
use redis::Commands;
use std::time::Duration;

/// Key kind for cache entries in the shared store.
const KEY_KIND: &str = "cache";

/// Redis-backed cache repository.
pub struct RedisCacheRepository {
    client: redis::Client,
    key_prefix: String,
    /// Applied to writes that do not carry an explicit TTL. `None` means
    /// entries persist until deleted.
    default_ttl: Option<Duration>,
}

impl RedisCacheRepository {
    /// Connect to Redis and verify the connection with a PING.
    ///
    /// Fails fast on an unparsable URL or an unreachable store; the caller
    /// never gets a repository that silently degrades.
    pub fn new(
        url: &str,
        key_prefix: impl Into<String>,
        default_ttl: Option<Duration>,
    ) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Configuration {
            message: format!("invalid Redis URL '{}'", url),
            source: Some(Box::new(e)),
        })?;

        let repo = Self {
            client,
            key_prefix: key_prefix.into(),
            default_ttl,
        };

        let mut conn = repo.connection()?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| Error::cache_write("Redis ping failed", e))?;

        tracing::info!(key_prefix = %repo.key_prefix, "redis cache repository initialized");
        Ok(repo)
    }

    fn cache_key(&self, key: &str) -> String {
        StoreKey::namespaced(&self.key_prefix, KEY_KIND, key)
    }

    fn connection(&self) -> Result<redis::Connection> {
        self.client
            .get_connection()
            .map_err(|e| Error::cache_write("failed to connect to Redis", e))
    }
}

impl CacheRepository for RedisCacheRepository {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = match self.connection() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache backend unreachable, treating as miss");
                return Ok(None);
            }
        };

        match conn.get::<_, Option<String>>(self.cache_key(key)) {
            Ok(Some(payload)) => {
                tracing::debug!(key, "cache hit");
                Ok(Some(payload))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        StoreKey::validate(key)?;

        let mut conn = self.connection()?;
        let cache_key = self.cache_key(key);

        let effective_ttl = ttl.or(self.default_ttl);
        match effective_ttl {
            Some(ttl) if !ttl.is_zero() => {
                let secs = ttl.as_secs().max(1);
                conn.set_ex::<_, _, ()>(&cache_key, value, secs)
                    .map_err(|e| {
                        Error::cache_write(format!("failed to write cache entry '{}'", key), e)
                    })?;
            }
            _ => {
                conn.set::<_, _, ()>(&cache_key, value).map_err(|e| {
                    Error::cache_write(format!("failed to write cache entry '{}'", key), e)
                })?;
            }
        }

        tracing::debug!(key, ttl = ?effective_ttl, "cache written");
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = match self.connection() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache backend unreachable, reporting absent");
                return Ok(false);
            }
        };

        match conn.exists::<_, bool>(self.cache_key(key)) {
            Ok(exists) => Ok(exists),
            Err(e) => {
                tracing::warn!(key, error = %e, "cache existence check failed, reporting absent");
                Ok(false)
            }
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.del::<_, ()>(self.cache_key(key))
            .map_err(|e| Error::cache_write(format!("failed to delete cache entry '{}'", key), e))?;
        tracing::debug!(key, "cache deleted");
        Ok(())
    }

    fn clear_matching(&self, pattern: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let scoped = StoreKey::namespaced(&self.key_prefix, KEY_KIND, pattern);
        let deleted = redis_util::delete_matching(&mut conn, &scoped)
            .map_err(|e| Error::cache_write("Redis cache clear failed", e))?;
        if deleted > 0 {
            tracing::info!(pattern, deleted, "cleared cache entries");
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisCacheRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheRepository")
            .field("key_prefix", &self.key_prefix)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_a_configuration_error() {
        let err = RedisCacheRepository::new("not-a-url", "gridlock", None).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn cache_keys_are_prefix_namespaced() {
        let repo = RedisCacheRepository {
            client: redis::Client::open("redis://127.0.0.1:1/").unwrap(),
            key_prefix: "plant-a".to_string(),
            default_ttl: None,
        };
        assert_eq!(repo.cache_key("regCache_1"), "plant-a:cache:regCache_1");
    }
}
