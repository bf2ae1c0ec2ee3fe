//! Backend factory.
//!
//! Turns a validated [`AppConfig`] into working lock, cache and status
//! handles. Selection happens here once; an unknown backend name, a
//! backend compiled out, or an unreachable store fails construction
//! instead of degrading later at a call site.

use crate::config::types::AppConfig;
use gridlock_domain::error::{Error, Result};
use gridlock_domain::ports::cache::SharedCache;
use gridlock_domain::ports::lock::LockManager;
use gridlock_domain::ports::status::StatusManager;
use gridlock_providers::{FileCacheRepository, FileStatusManager, ThreadLockManager};
use std::sync::Arc;

#[cfg(feature = "backend-redis")]
use gridlock_providers::{RedisCacheRepository, RedisLockManager, RedisStatusManager};
#[cfg(feature = "backend-redis")]
use std::time::Duration;

/// The wired coordination handles for one deployment.
#[derive(Clone)]
pub struct CoordinationHandles {
    /// Mutual exclusion.
    pub lock_manager: Arc<dyn LockManager>,
    /// Typed cache access.
    pub cache: SharedCache,
    /// Status flags.
    pub status: Arc<dyn StatusManager>,
    /// Device instance identifier from the configuration.
    pub instance_id: String,
}

impl std::fmt::Debug for CoordinationHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationHandles")
            .field("backend", &self.lock_manager.backend_name())
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

/// Builds backends from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendFactory;

impl BackendFactory {
    pub fn new() -> Self {
        Self
    }

    /// Build the handles the configuration selects.
    pub fn build(&self, config: &AppConfig) -> Result<CoordinationHandles> {
        match config.coordination.backend.as_str() {
            "local" => self.build_local(config),
            "redis" => self.build_redis(config),
            other => Err(Error::config(format!(
                "unknown coordination backend '{other}', expected 'local' or 'redis'"
            ))),
        }
    }

    fn build_local(&self, config: &AppConfig) -> Result<CoordinationHandles> {
        let local = &config.coordination.local;

        let cache = SharedCache::new(Arc::new(FileCacheRepository::new(&local.cache_dir)?));
        let status = Arc::new(FileStatusManager::new(local.effective_status_dir())?);
        let lock_manager = Arc::new(ThreadLockManager::new());

        tracing::info!(cache_dir = %local.cache_dir, "local coordination backends ready");

        Ok(CoordinationHandles {
            lock_manager,
            cache,
            status,
            instance_id: config.coordination.instance_id.clone(),
        })
    }

    #[cfg(feature = "backend-redis")]
    fn build_redis(&self, config: &AppConfig) -> Result<CoordinationHandles> {
        let redis = &config.coordination.redis;

        let lock_manager = Arc::new(RedisLockManager::new(
            &redis.url,
            &redis.key_prefix,
            Duration::from_secs(redis.lock_ttl_secs),
        )?);

        let cache_ttl = if redis.cache_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(redis.cache_ttl_secs))
        };
        let cache = SharedCache::new(Arc::new(RedisCacheRepository::new(
            &redis.url,
            &redis.key_prefix,
            cache_ttl,
        )?));

        let status = Arc::new(
            RedisStatusManager::new(&redis.url, &redis.key_prefix)?
                .with_default_ttl(Duration::from_secs(redis.status_ttl_secs)),
        );

        tracing::info!(key_prefix = %redis.key_prefix, "redis coordination backends ready");

        Ok(CoordinationHandles {
            lock_manager,
            cache,
            status,
            instance_id: config.coordination.instance_id.clone(),
        })
    }

    #[cfg(not(feature = "backend-redis"))]
    fn build_redis(&self, _config: &AppConfig) -> Result<CoordinationHandles> {
        Err(Error::config(
            "coordination backend 'redis' requires the 'backend-redis' feature",
        ))
    }
}
