//! Key construction utilities shared by every backend.
//!
//! Distributed backends namespace their keys as `{prefix}:{kind}:{name}` so
//! multiple independent deployments can share one backing store without
//! collision. The file-backed implementations map names onto filesystem
//! paths and use [`StoreKey::sanitize_for_path`] to keep names inside the
//! configured directory.

use crate::error::{Error, Result};

/// Maximum accepted length for a resource name or cache key.
pub const MAX_KEY_LEN: usize = 250;

/// Key utilities
pub struct StoreKey;

impl StoreKey {
    /// Build a namespaced key for a shared store.
    ///
    /// `kind` distinguishes the subsystem owning the key (`"lock"`,
    /// `"cache"` or `"status"`).
    pub fn namespaced(prefix: &str, kind: &str, name: &str) -> String {
        format!("{}:{}:{}", prefix, kind, name)
    }

    /// Validate a resource name or cache key.
    pub fn validate(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::config("key cannot be empty"));
        }

        if name.len() > MAX_KEY_LEN {
            return Err(Error::config(format!(
                "key too long (max {} characters)",
                MAX_KEY_LEN
            )));
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(Error::config("key contains control characters"));
        }

        Ok(())
    }

    /// Sanitize a key for use as a file name.
    ///
    /// Path separators and control characters are replaced so a key can
    /// never escape the backing directory.
    pub fn sanitize_for_path(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_control() || matches!(c, '/' | '\\' | ':' | '.') {
                    '_'
                } else {
                    c
                }
            })
            .take(MAX_KEY_LEN)
            .collect()
    }
}
