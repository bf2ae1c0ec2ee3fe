//! Cache Repository Port
//!
//! Port for atomic cache backends. Implementations store opaque JSON
//! payloads; a reader observes either the complete previous value or the
//! complete new value, never a partial write. [`SharedCache`] layers typed
//! serde access on top of the raw string contract.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Cache repository interface
///
/// ## Error handling
///
/// A corrupted or unreadable stored payload is treated as a miss (logged,
/// returns `None`), never surfaced as an error: callers must tolerate cache
/// loss gracefully. Serialization or durable-write failure on `set_raw`
/// propagates as [`Error::CacheWrite`] after any partial artifact has been
/// cleaned up.
pub trait CacheRepository: Send + Sync {
    /// Retrieve the stored payload for `key`, or `None` if absent.
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Durably replace the payload for `key`.
    ///
    /// Atomic with respect to concurrent readers and resilient to a crash
    /// mid-write. `ttl` is honoured by backends with native expiry and
    /// ignored (logged at debug) by the file backend.
    fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Whether `key` currently has a stored payload.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Remove the payload for `key`. Deleting an absent key is a no-op.
    fn delete(&self, key: &str) -> Result<()>;

    /// Remove every entry whose key matches `pattern` (`*` wildcard).
    ///
    /// Distributed implementations must enumerate with a cursor rather
    /// than one unbounded listing call.
    fn clear_matching(&self, pattern: &str) -> Result<()>;

    /// Identifier of this backend implementation.
    fn backend_name(&self) -> &'static str;
}

/// Typed wrapper over a [`CacheRepository`].
///
/// Serializes values to JSON on `set` and deserializes on `get`, treating
/// payloads that no longer deserialize as misses in line with the port's
/// corruption policy.
#[derive(Clone)]
pub struct SharedCache {
    repo: Arc<dyn CacheRepository>,
}

impl SharedCache {
    /// Wrap a repository.
    pub fn new(repo: Arc<dyn CacheRepository>) -> Self {
        Self { repo }
    }

    /// The underlying repository.
    pub fn repository(&self) -> Arc<dyn CacheRepository> {
        self.repo.clone()
    }

    /// Get a typed value from the cache.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.repo.get_raw(key)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(
                        key,
                        error = %e,
                        "stored payload does not deserialize, treating as cache miss"
                    );
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    pub fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value).map_err(|e| Error::CacheWrite {
            message: format!("failed to serialize value for '{}'", key),
            source: Some(Box::new(e)),
        })?;
        self.repo.set_raw(key, &json, ttl)
    }

    /// Whether `key` currently has a stored payload.
    pub fn exists(&self, key: &str) -> Result<bool> {
        self.repo.exists(key)
    }

    /// Remove the payload for `key`.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.repo.delete(key)
    }
}

impl std::fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("backend", &self.repo.backend_name())
            .finish()
    }
}
