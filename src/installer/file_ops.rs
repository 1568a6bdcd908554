//! Basic file operations for package installation
//!
//! This module handles low-level file operations:
//! - Directory creation (`ensure_parent_dir`)
//! - Whole-file replacement through a sibling temp file (`write_atomic`)
//! - Timestamped backups beside the original (`backup_file`)
//!
//! A destination file is either fully written or untouched; nothing here
//! truncates a file in place.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::{Result, file_read_failed, file_write_failed};

/// Backup file suffix
pub const BACKUP_SUFFIX: &str = "bak";

/// Ensure parent directory exists for a path
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| file_write_failed(parent, e))?;
    }
    Ok(())
}

/// Replace `target` with `content` via a temp file in the same directory
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(target)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| file_write_failed(target, e))?;
    temp.write_all(content)
        .map_err(|e| file_write_failed(target, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| file_write_failed(target, e))?;
    temp.persist(target)
        .map_err(|e| file_write_failed(target, e.error))?;

    Ok(())
}

/// Copy `path` to `<path>.<timestamp>.bak` beside it and return the backup path
///
/// A numeric suffix is added if a backup with the same timestamp already exists.
pub fn backup_file(path: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
    let content = std::fs::read(path).map_err(|e| file_read_failed(path, e))?;
    let backup = next_backup_path(path, at);
    write_atomic(&backup, &content)?;
    Ok(backup)
}

fn next_backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = at.format("%Y%m%dT%H%M%SZ");

    let mut candidate = path.with_file_name(format!("{file_name}.{stamp}.{BACKUP_SUFFIX}"));
    let mut counter = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{file_name}.{stamp}-{counter}.{BACKUP_SUFFIX}"));
        counter += 1;
    }
    candidate
}
