//! Atomic file replacement.
//!
//! Writes follow the temp-write-then-rename protocol:
//!
//! 1. write the payload to a temporary sibling (`.{filename}.tmp`)
//! 2. flush and fsync it
//! 3. atomically rename it over the destination
//!
//! A concurrent reader therefore observes only the complete old or the
//! complete new content, and a crash mid-write leaves at worst a stale
//! temporary sibling that never shadows the destination. On any failure
//! the partial temporary artifact is removed before the error propagates.
//!
//! Source and destination must live on the same filesystem for the rename
//! to be atomic.

use gridlock_domain::error::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically replace the content of `path` with `content`.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = temp_sibling(path)?;

    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::cache_write(
            format!("failed to atomically replace '{}'", path.display()),
            e,
        )
    })?;

    // Persist the directory entry as well.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Temporary sibling path in the same directory as `target`.
fn temp_sibling(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::CacheWrite {
            message: format!("invalid cache path '{}'", target.display()),
            source: None,
        })?;
    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        Error::cache_write(
            format!("failed to create temporary file '{}'", path.display()),
            e,
        )
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        Error::cache_write("failed to write temporary file", e)
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        Error::cache_write("failed to sync temporary file to disk", e)
    })?;

    Ok(())
}
