//! File status manager
//!
//! Flags are hidden marker files under the status directory: present means
//! set, absent means clear. There is no expiry, so a crashed setter leaves
//! its flag behind until [`FileStatusManager::clear_all`] runs at the next
//! startup. Pass a `ttl` only to backends with native expiry.

use gridlock_domain::error::{Error, Result};
use gridlock_domain::keys::StoreKey;
use gridlock_domain::ports::status::StatusManager;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flags cleared by [`FileStatusManager::clear_all`].
///
/// Marker files are only ever created by this manager, but the clear list
/// is fixed so a startup reset never deletes unrelated dotfiles that
/// happen to live in a shared directory.
const DEFAULT_KNOWN_FLAGS: &[&str] = &["FCRunning", "FERunning", "lockfile"];

/// Status manager backed by marker files.
pub struct FileStatusManager {
    status_dir: PathBuf,
    known_flags: Vec<String>,
}

impl FileStatusManager {
    /// Create a manager rooted at `status_dir`, creating it if needed.
    pub fn new(status_dir: impl AsRef<Path>) -> Result<Self> {
        let status_dir = status_dir.as_ref().to_path_buf();
        fs::create_dir_all(&status_dir).map_err(|e| {
            Error::status_backend(
                format!(
                    "failed to create status directory '{}'",
                    status_dir.display()
                ),
                e,
            )
        })?;

        tracing::info!(status_dir = %status_dir.display(), "file status manager initialized");

        Ok(Self {
            status_dir,
            known_flags: DEFAULT_KNOWN_FLAGS
                .iter()
                .map(|&f| f.to_string())
                .collect(),
        })
    }

    /// Replace the set of flags that `clear_all` resets.
    pub fn with_known_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.known_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    fn flag_path(&self, name: &str) -> PathBuf {
        self.status_dir
            .join(format!(".{}", StoreKey::sanitize_for_path(name)))
    }
}

impl StatusManager for FileStatusManager {
    fn set_status(&self, name: &str, ttl: Option<Duration>) -> Result<()> {
        StoreKey::validate(name)?;

        if ttl.is_some() {
            tracing::debug!(flag = name, "file status backend has no expiry, ttl ignored");
        }

        let path = self.flag_path(name);
        fs::write(&path, b"").map_err(|e| {
            Error::status_backend(format!("failed to set status flag '{}'", name), e)
        })?;

        tracing::debug!(flag = name, "status flag set");
        Ok(())
    }

    fn clear_status(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.flag_path(name)) {
            Ok(()) => {
                tracing::debug!(flag = name, "status flag cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::status_backend(
                format!("failed to clear status flag '{}'", name),
                e,
            )),
        }
    }

    fn is_status_set(&self, name: &str) -> Result<bool> {
        Ok(self.flag_path(name).exists())
    }

    fn clear_all(&self) -> Result<()> {
        for flag in &self.known_flags {
            // Best effort: one stubborn flag must not block the reset.
            if let Err(e) = self.clear_status(flag) {
                tracing::warn!(flag, error = %e, "failed to clear status flag during reset");
            }
        }
        tracing::info!("status flags reset");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

impl std::fmt::Debug for FileStatusManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStatusManager")
            .field("status_dir", &self.status_dir)
            .field("known_flags", &self.known_flags)
            .finish()
    }
}
