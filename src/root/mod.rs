//! Installation roots and package identities
//!
//! An installation root is any directory resources get installed into. It
//! holds at most one core package and any number of expansion packages, each
//! under its own marker directory:
//!
//! ```text
//! <root>/
//! ├── .agentkit-core/             # Core package files
//! │   └── install-manifest.yaml   # What agentkit wrote for the core package
//! ├── .<pack-id>/                 # One directory per expansion package
//! │   ├── install-manifest.yaml
//! │   └── config.yaml
//! ├── agentkit-agent/             # Legacy layout, never carries a manifest
//! └── .agentkit.lock              # Advisory lock while an operation runs
//! ```
//!
//! The root is passed explicitly to every operation; nothing here is global.

pub mod detection;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use fslock::LockFile;

use crate::error::{AgentkitError, Result, invalid_package_id, path_error};

/// Core package id, reserved for the core marker directory
pub const CORE_PACKAGE_ID: &str = "agentkit-core";

/// Core package marker directory
pub const CORE_DIR: &str = ".agentkit-core";

/// Legacy layout marker directory
pub const LEGACY_DIR: &str = "agentkit-agent";

/// Manifest filename inside every package directory
pub const MANIFEST_FILE: &str = "install-manifest.yaml";

/// Package config filename (source collections and installed packages)
pub const PACKAGE_CONFIG_FILE: &str = "config.yaml";

/// Advisory lock file at the root
pub const LOCK_FILE: &str = ".agentkit.lock";

/// Placeholder rewritten to a package's marker directory when files are copied
pub const ROOT_PLACEHOLDER: &str = "{root}";

/// Version-control directories that are never packages
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Identity of an installable package
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageId {
    /// The core package
    Core,
    /// An expansion package, by validated id
    Expansion(String),
}

impl PackageId {
    /// Create a validated expansion package id
    pub fn expansion(id: &str) -> Result<Self> {
        if is_valid_package_id(id) {
            Ok(Self::Expansion(id.to_string()))
        } else {
            Err(invalid_package_id(id))
        }
    }

    /// The bare id (`agentkit-core` for the core package)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Core => CORE_PACKAGE_ID,
            Self::Expansion(id) => id,
        }
    }

    /// Name of the package's marker directory under the root
    ///
    /// This is also the token `{root}` is rewritten to in the package's files.
    pub fn marker_dir(&self) -> String {
        match self {
            Self::Core => CORE_DIR.to_string(),
            Self::Expansion(id) => format!(".{id}"),
        }
    }

    /// Recover a package id from the first component of an installed path
    pub fn from_marker_dir(name: &str) -> Option<Self> {
        if name == CORE_DIR {
            return Some(Self::Core);
        }
        let id = name.strip_prefix('.')?;
        Self::expansion(id).ok()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expansion package ids match `[a-z0-9-]+` and may not shadow the core id
pub fn is_valid_package_id(id: &str) -> bool {
    !id.is_empty()
        && id != CORE_PACKAGE_ID
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// A directory resources are installed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRoot {
    path: PathBuf,
}

impl InstallationRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the root if needed
    ///
    /// # Errors
    ///
    /// Returns `PathError` when the path exists but is not a directory, or
    /// cannot be created.
    pub fn ensure(&self) -> Result<()> {
        if self.path.exists() && !self.path.is_dir() {
            return Err(path_error(
                self.path.display().to_string(),
                "exists and is not a directory",
            ));
        }
        fs::create_dir_all(&self.path)
            .map_err(|e| path_error(self.path.display().to_string(), e.to_string()))
    }

    /// Absolute directory of a package's files
    pub fn package_dir(&self, package: &PackageId) -> PathBuf {
        self.path.join(package.marker_dir())
    }

    /// Absolute path of a package's manifest
    pub fn manifest_path(&self, package: &PackageId) -> PathBuf {
        self.package_dir(package).join(MANIFEST_FILE)
    }

    /// Resolve a root-relative, forward-slash path
    ///
    /// Paths that would leave the root are refused.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        crate::path_utils::join_relative(&self.path, relative)
            .ok_or_else(|| path_error(relative, "path leaves the installation root"))
    }

    /// Acquire the root's advisory lock without blocking
    ///
    /// The root is created if missing so the lock file has somewhere to live.
    ///
    /// # Errors
    ///
    /// Returns `RootLocked` if another holder has the lock.
    pub fn lock(&self) -> Result<RootGuard> {
        self.ensure()?;
        let lock_path = self.path.join(LOCK_FILE);

        let mut lock = LockFile::open(&lock_path)
            .map_err(|e| path_error(lock_path.display().to_string(), e.to_string()))?;

        let acquired = lock
            .try_lock()
            .map_err(|e| path_error(lock_path.display().to_string(), e.to_string()))?;

        if !acquired {
            return Err(AgentkitError::RootLocked {
                path: self.path.display().to_string(),
            });
        }

        Ok(RootGuard { lock })
    }
}

/// RAII guard for the root's advisory lock
///
/// Concurrent agentkit runs against one root are unsupported; the lock turns
/// the second one into a clean `RootLocked` error instead of interleaved writes.
/// The lock file stays on disk after release; every holder must lock the same
/// file, so it is never removed.
#[derive(Debug)]
pub struct RootGuard {
    lock: LockFile,
}

impl Drop for RootGuard {
    fn drop(&mut self) {
        let _ = self.lock.unlock();
    }
}
