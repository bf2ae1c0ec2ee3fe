//! Typed configuration.
//!
//! Every field has a serde default so a partial TOML file or a bare
//! environment only overrides what it names. Validation happens in the
//! loader, not here.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Lock, cache and status backend selection.
    pub coordination: CoordinationConfig,
    /// Logging bootstrap.
    pub logging: LoggingConfig,
}

/// Backend selection and per-backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// `"local"` for single-process deployments, `"redis"` for shared
    /// ones. Anything else fails construction.
    pub backend: String,
    /// Device instance identifier, used in cache key names.
    pub instance_id: String,
    /// Settings for the local backends.
    pub local: LocalBackendConfig,
    /// Settings for the Redis backends.
    pub redis: RedisBackendConfig,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            instance_id: "1".to_string(),
            local: LocalBackendConfig::default(),
            redis: RedisBackendConfig::default(),
        }
    }
}

/// File-backed cache and status settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    /// Directory for cache entries.
    pub cache_dir: String,
    /// Directory for status flags. Empty means `cache_dir`.
    pub status_dir: String,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            cache_dir: "cache".to_string(),
            status_dir: String::new(),
        }
    }
}

impl LocalBackendConfig {
    /// Effective status directory.
    pub fn effective_status_dir(&self) -> &str {
        if self.status_dir.is_empty() {
            &self.cache_dir
        } else {
            &self.status_dir
        }
    }
}

/// Redis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisBackendConfig {
    /// Connection URL.
    pub url: String,
    /// Namespace prefix for every key this deployment writes.
    pub key_prefix: String,
    /// Lock auto-expiry. Must exceed the worst-case critical section.
    pub lock_ttl_secs: u64,
    /// Status flag staleness bound.
    pub status_ttl_secs: u64,
    /// Cache entry expiry. Zero means entries persist until deleted.
    pub cache_ttl_secs: u64,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "gridlock".to_string(),
            lock_ttl_secs: 30,
            status_ttl_secs: 3600,
            cache_ttl_secs: 0,
        }
    }
}

/// Logging bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `GRIDLOCK_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_the_local_backend() {
        let config = AppConfig::default();
        assert_eq!(config.coordination.backend, "local");
        assert_eq!(config.coordination.instance_id, "1");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn redis_defaults_match_the_documented_surface() {
        let redis = RedisBackendConfig::default();
        assert_eq!(redis.url, "redis://127.0.0.1:6379");
        assert_eq!(redis.key_prefix, "gridlock");
        assert_eq!(redis.lock_ttl_secs, 30);
        assert_eq!(redis.status_ttl_secs, 3600);
        assert_eq!(redis.cache_ttl_secs, 0);
    }

    #[test]
    fn empty_status_dir_falls_back_to_cache_dir() {
        let local = LocalBackendConfig::default();
        assert_eq!(local.effective_status_dir(), "cache");

        let explicit = LocalBackendConfig {
            cache_dir: "cache".to_string(),
            status_dir: "status".to_string(),
        };
        assert_eq!(explicit.effective_status_dir(), "status");
    }

    #[test]
    fn partial_toml_only_overrides_named_fields() {
        let config: AppConfig = toml::from_str(
            r#"
[coordination]
backend = "redis"
"#,
        )
        .unwrap();
        assert_eq!(config.coordination.backend, "redis");
        assert_eq!(config.coordination.instance_id, "1");
        assert_eq!(config.coordination.redis.lock_ttl_secs, 30);
    }
}
