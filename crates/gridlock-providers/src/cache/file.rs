//! File cache repository
//!
//! Durable local cache for single-process deployments. Each key maps to a
//! JSON file under the cache directory; writes go through the atomic
//! temp-write-then-rename protocol so readers never observe a partial
//! payload, and a per-key mutex serializes writers on the same key to
//! avoid lost-update interleavings between temp-artifact creation and the
//! rename. Writers on distinct keys proceed independently.
//!
//! Concurrent writers on the same key race to last-write-wins, never to a
//! corrupt value. Unreadable stored payloads are logged and reported as
//! misses.

use crate::cache::atomic::atomic_write;
use globset::Glob;
use gridlock_domain::error::{Error, Result};
use gridlock_domain::keys::StoreKey;
use gridlock_domain::ports::cache::CacheRepository;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// File-backed cache repository.
pub struct FileCacheRepository {
    cache_dir: PathBuf,
    /// Per-key write locks, lazily created under one registry mutex.
    /// Grows with the number of distinct ever-seen keys.
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileCacheRepository {
    /// Create a repository rooted at `cache_dir`, creating it if needed.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir).map_err(|e| {
            Error::io(
                format!("failed to create cache directory '{}'", cache_dir.display()),
                e,
            )
        })?;

        tracing::info!(cache_dir = %cache_dir.display(), "file cache repository initialized");

        Ok(Self {
            cache_dir,
            key_locks: Mutex::new(HashMap::new()),
        })
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", StoreKey::sanitize_for_path(key)))
    }

    /// Get or lazily create the write lock for `key`.
    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl CacheRepository for FileCacheRepository {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read cache entry, treating as miss");
                return Ok(None);
            }
        };

        let Ok(payload) = String::from_utf8(bytes) else {
            tracing::warn!(key, "cache entry is not valid UTF-8, treating as miss");
            return Ok(None);
        };

        // Corrupt payloads are a miss, not an error.
        if serde_json::from_str::<serde_json::Value>(&payload).is_err() {
            tracing::warn!(key, "cache entry is not valid JSON, treating as miss");
            return Ok(None);
        }

        tracing::debug!(key, "cache hit");
        Ok(Some(payload))
    }

    fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        StoreKey::validate(key)?;

        if ttl.is_some() {
            tracing::debug!(key, "file cache backend has no expiry, ttl ignored");
        }

        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        atomic_write(&self.file_path(key), value.as_bytes())?;
        tracing::debug!(key, "cache written");
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.file_path(key).exists())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(());
        }

        let lock = self.key_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(key, "cache deleted");
                Ok(())
            }
            // Raced with another deleter; the entry is gone either way.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(format!("failed to delete cache entry '{}'", key), e)),
        }
    }

    fn clear_matching(&self, pattern: &str) -> Result<()> {
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::Configuration {
                message: format!("invalid cache clear pattern '{}'", pattern),
                source: Some(Box::new(e)),
            })?
            .compile_matcher();

        let entries = fs::read_dir(&self.cache_dir).map_err(|e| {
            Error::io(
                format!("failed to read cache directory '{}'", self.cache_dir.display()),
                e,
            )
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::io("failed to read cache directory entry", e))?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if matcher.is_match(stem) {
                match fs::remove_file(&path) {
                    Ok(()) => tracing::debug!(key = stem, "cleared cache entry"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(key = stem, error = %e, "failed to clear cache entry")
                    }
                }
            }
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

impl std::fmt::Debug for FileCacheRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCacheRepository")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_domain::ports::cache::SharedCache;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        power_w: i64,
        soc_percent: u8,
    }

    fn repo(dir: &TempDir) -> Arc<FileCacheRepository> {
        Arc::new(FileCacheRepository::new(dir.path()).unwrap())
    }

    #[test]
    fn new_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        FileCacheRepository::new(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn set_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = SharedCache::new(repo(&dir));
        let reading = Reading {
            power_w: 2400,
            soc_percent: 87,
        };
        cache.set("regCache_1", &reading, None).unwrap();
        assert_eq!(cache.get::<Reading>("regCache_1").unwrap(), Some(reading));
    }

    #[test]
    fn get_never_written_key_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(repo(&dir).get_raw("missing").unwrap().is_none());
    }

    #[test]
    fn overwrite_replaces_previous_value() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.set_raw("k", "\"v1\"", None).unwrap();
        repo.set_raw("k", "\"v2\"", None).unwrap();
        assert_eq!(repo.get_raw("k").unwrap().as_deref(), Some("\"v2\""));
    }

    #[test]
    fn exists_reflects_stored_state() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        assert!(!repo.exists("k").unwrap());
        repo.set_raw("k", "1", None).unwrap();
        assert!(repo.exists("k").unwrap());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.delete("never_written").unwrap();
        repo.set_raw("k", "1", None).unwrap();
        repo.delete("k").unwrap();
        repo.delete("k").unwrap();
        assert!(!repo.exists("k").unwrap());
    }

    #[test]
    fn corrupt_payload_is_a_logged_miss() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.set_raw("k", "{\"ok\":true}", None).unwrap();
        fs::write(dir.path().join("k.json"), "{\"ok\":tr").unwrap();
        assert!(repo.get_raw("k").unwrap().is_none());
    }

    #[test]
    fn stale_temp_artifact_preserves_previous_value() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.set_raw("k", "\"complete\"", None).unwrap();
        // A writer that crashed after creating its temp artifact but
        // before the rename leaves only the sibling behind.
        fs::write(dir.path().join(".k.json.tmp"), "\"trunc").unwrap();
        assert_eq!(repo.get_raw("k").unwrap().as_deref(), Some("\"complete\""));
    }

    #[test]
    fn keys_cannot_escape_cache_directory() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.set_raw("../escape", "1", None).unwrap();
        assert!(repo.exists("../escape").unwrap());
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }

    #[test]
    fn ttl_is_ignored_but_accepted() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.set_raw("k", "1", Some(Duration::from_secs(1))).unwrap();
        assert!(repo.exists("k").unwrap());
    }

    #[test]
    fn clear_matching_removes_only_matching_keys() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        repo.set_raw("regCache_1", "1", None).unwrap();
        repo.set_raw("regCache_2", "2", None).unwrap();
        repo.set_raw("lastUpdate_1", "3", None).unwrap();

        repo.clear_matching("regCache_*").unwrap();

        assert!(!repo.exists("regCache_1").unwrap());
        assert!(!repo.exists("regCache_2").unwrap());
        assert!(repo.exists("lastUpdate_1").unwrap());
    }

    #[test]
    fn clear_matching_rejects_bad_pattern() {
        let dir = TempDir::new().unwrap();
        assert!(repo(&dir).clear_matching("[unclosed").is_err());
    }

    #[test]
    fn empty_key_is_rejected_on_set() {
        let dir = TempDir::new().unwrap();
        assert!(repo(&dir).set_raw("", "1", None).is_err());
    }
}
