//! Layered configuration loading.
//!
//! Three layers, later ones winning:
//!
//! 1. compiled-in defaults ([`AppConfig::default`])
//! 2. a TOML file, when one is given and exists
//! 3. `GRIDLOCK_`-prefixed environment variables, `__` separating nesting
//!    levels (`GRIDLOCK_COORDINATION__BACKEND=redis`)
//!
//! Loading fails fast on unparsable input or an invalid backend name; a
//! misconfigured deployment never gets running handles.

use crate::config::types::AppConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gridlock_domain::error::{Error, Result};
use std::path::Path;

/// Backend names the factory accepts.
const KNOWN_BACKENDS: &[&str] = &["local", "redis"];

/// Loads and validates [`AppConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load from defaults and environment only.
    pub fn load(&self) -> Result<AppConfig> {
        self.extract(self.base())
    }

    /// Load with a TOML file layered between defaults and environment.
    ///
    /// A missing file is not an error; figment skips it and the defaults
    /// stand.
    pub fn load_with_file(&self, path: &Path) -> Result<AppConfig> {
        self.extract(self.base().merge(Toml::file(path)))
    }

    fn base(&self) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    fn extract(&self, figment: Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .merge(Env::prefixed("GRIDLOCK_").split("__"))
            .extract()
            .map_err(|e| Error::config(format!("failed to load configuration: {e}")))?;

        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    let backend = config.coordination.backend.as_str();
    if !KNOWN_BACKENDS.contains(&backend) {
        return Err(Error::config(format!(
            "unknown coordination backend '{backend}', expected one of: {}",
            KNOWN_BACKENDS.join(", ")
        )));
    }

    if config.coordination.instance_id.is_empty() {
        return Err(Error::config("coordination.instance_id must not be empty"));
    }

    if backend == "local" && config.coordination.local.cache_dir.is_empty() {
        return Err(Error::config(
            "coordination.local.cache_dir must not be empty",
        ));
    }

    if backend == "redis" && config.coordination.redis.lock_ttl_secs == 0 {
        return Err(Error::config(
            "coordination.redis.lock_ttl_secs must be positive",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_and_validate() {
        figment::Jail::expect_with(|_| {
            let config = ConfigLoader::new().load().unwrap();
            assert_eq!(config.coordination.backend, "local");
            Ok(())
        });
    }

    #[test]
    fn file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "gridlock.toml",
                r#"
[coordination]
backend = "redis"
instance_id = "2"

[coordination.redis]
key_prefix = "plant-a"
"#,
            )?;

            let config = ConfigLoader::new()
                .load_with_file(Path::new("gridlock.toml"))
                .unwrap();
            assert_eq!(config.coordination.backend, "redis");
            assert_eq!(config.coordination.instance_id, "2");
            assert_eq!(config.coordination.redis.key_prefix, "plant-a");
            // Unnamed fields keep their defaults.
            assert_eq!(config.coordination.redis.lock_ttl_secs, 30);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "gridlock.toml",
                r#"
[coordination]
backend = "local"
instance_id = "2"
"#,
            )?;
            jail.set_env("GRIDLOCK_COORDINATION__INSTANCE_ID", "3");

            let config = ConfigLoader::new()
                .load_with_file(Path::new("gridlock.toml"))
                .unwrap();
            assert_eq!(config.coordination.instance_id, "3");
            assert_eq!(config.coordination.backend, "local");
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        figment::Jail::expect_with(|_| {
            let config = ConfigLoader::new()
                .load_with_file(Path::new("does-not-exist.toml"))
                .unwrap();
            assert_eq!(config.coordination.backend, "local");
            Ok(())
        });
    }

    #[test]
    fn unknown_backend_fails_fast() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRIDLOCK_COORDINATION__BACKEND", "etcd");
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }));
            Ok(())
        });
    }

    #[test]
    fn empty_instance_id_fails_fast() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRIDLOCK_COORDINATION__INSTANCE_ID", "");
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }));
            Ok(())
        });
    }

    #[test]
    fn zero_lock_ttl_fails_fast_for_redis() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRIDLOCK_COORDINATION__BACKEND", "redis");
            jail.set_env("GRIDLOCK_COORDINATION__REDIS__LOCK_TTL_SECS", "0");
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }));
            Ok(())
        });
    }

    #[test]
    fn unparsable_toml_fails_fast() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("gridlock.toml", "[coordination\nbackend =")?;
            let err = ConfigLoader::new()
                .load_with_file(Path::new("gridlock.toml"))
                .unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }));
            Ok(())
        });
    }
}
