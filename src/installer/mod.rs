//! File synchronization for package installs
//!
//! This module handles:
//! - Rendering each planned source file (placeholder rewrite or verbatim copy)
//! - Writing only what changed, atomically
//! - Backing up files the user modified before replacing them
//! - Reporting files a previous install recorded that the new plan drops
//!
//! The engine never deletes anything. It also never writes the manifest;
//! callers do that only after a sync completes.

pub mod detection;
pub mod file_ops;
pub mod render;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::collection::CollectionId;
use crate::error::{AgentkitError, Result};
use crate::hash::{hash_bytes, hash_file, verify_hash};
use crate::manifest::{Manifest, ManifestFile};
use crate::root::{InstallationRoot, PackageId};
use crate::ui::ProgressReporter;

/// How to treat destination files that already exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Replace existing files whose content differs
    #[default]
    Overwrite,
    /// Leave every existing file alone
    SkipExisting,
}

/// One source file and where it installs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub source: PathBuf,
    /// Root-relative, forward-slash destination
    pub destination: String,
    pub origin: CollectionId,
}

/// Everything one package install writes
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub package: PackageId,
    files: Vec<PlannedFile>,
    destinations: BTreeSet<String>,
}

impl SyncPlan {
    pub fn new(package: PackageId) -> Self {
        Self {
            package,
            files: Vec::new(),
            destinations: BTreeSet::new(),
        }
    }

    /// Add a file; the first file planned for a destination wins
    pub fn add(&mut self, source: PathBuf, destination: String, origin: CollectionId) -> bool {
        if !self.destinations.insert(destination.clone()) {
            return false;
        }
        self.files.push(PlannedFile {
            source,
            destination,
            origin,
        });
        true
    }

    pub fn files(&self) -> &[PlannedFile] {
        &self.files
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.destinations.contains(destination)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The token `{root}` becomes in this package's files
    pub fn token(&self) -> String {
        self.package.marker_dir()
    }
}

/// What happened to one planned file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
        })
    }
}

/// A planned file after sync, with the hash of what is now on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncedFile {
    pub path: String,
    pub hash: String,
    pub status: FileStatus,
}

/// Result of one package sync
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub files: Vec<SyncedFile>,
    /// Root-relative paths of backups made before overwriting
    pub backups: Vec<String>,
    /// Paths the previous manifest recorded that this plan no longer includes
    pub orphaned: Vec<String>,
}

impl SyncReport {
    /// Paths that were created or replaced
    pub fn written(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Created | FileStatus::Updated))
            .map(|f| f.path.as_str())
            .collect()
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// Manifest entries for every planned file
    pub fn manifest_files(&self) -> Vec<ManifestFile> {
        self.files
            .iter()
            .map(|f| ManifestFile::new(f.path.clone(), f.hash.clone()))
            .collect()
    }
}

/// Copies planned files into an installation root
pub struct FileSyncEngine<'a> {
    root: &'a InstallationRoot,
    mode: SyncMode,
    previous: Option<&'a Manifest>,
    now: DateTime<Utc>,
}

impl<'a> FileSyncEngine<'a> {
    pub fn new(root: &'a InstallationRoot) -> Self {
        Self {
            root,
            mode: SyncMode::Overwrite,
            previous: None,
            now: Utc::now(),
        }
    }

    pub fn mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// The package's manifest from before this sync, used to tell files the
    /// user edited from files agentkit wrote
    pub fn previous(mut self, manifest: Option<&'a Manifest>) -> Self {
        self.previous = manifest;
        self
    }

    /// Timestamp used to name backups
    pub fn timestamp(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Sync every planned file
    ///
    /// # Errors
    ///
    /// Returns `WriteFailure` naming the failing file and how many files were
    /// handled before it. Files already written stay in place.
    pub fn sync(
        &self,
        plan: &SyncPlan,
        mut progress: Option<&mut (dyn ProgressReporter + '_)>,
    ) -> Result<SyncReport> {
        let token = plan.token();
        let mut report = SyncReport::default();

        for (completed, planned) in plan.files().iter().enumerate() {
            let synced = self
                .sync_file(planned, &token, &mut report.backups)
                .map_err(|err| AgentkitError::WriteFailure {
                    path: planned.destination.clone(),
                    completed,
                    reason: failure_reason(err),
                })?;

            debug!(path = %synced.path, status = %synced.status, "Synced file");
            if let Some(progress) = progress.as_deref_mut() {
                progress.file_done(&synced.path);
            }
            report.files.push(synced);
        }

        if let Some(previous) = self.previous {
            report.orphaned = previous
                .paths()
                .filter(|path| !plan.contains(path))
                .map(str::to_string)
                .collect();
        }

        info!(
            package = %plan.package,
            created = report.count(FileStatus::Created),
            updated = report.count(FileStatus::Updated),
            unchanged = report.count(FileStatus::Unchanged),
            skipped = report.count(FileStatus::Skipped),
            backups = report.backups.len(),
            "Synced package files"
        );

        Ok(report)
    }

    fn sync_file(
        &self,
        planned: &PlannedFile,
        token: &str,
        backups: &mut Vec<String>,
    ) -> Result<SyncedFile> {
        let destination = self.root.resolve(&planned.destination)?;
        let synced = |hash: String, status: FileStatus| SyncedFile {
            path: planned.destination.clone(),
            hash,
            status,
        };

        if destination.is_file() && self.mode == SyncMode::SkipExisting {
            return Ok(synced(hash_file(&destination)?, FileStatus::Skipped));
        }

        let content = render::render(&planned.source, token)?;
        let new_hash = hash_bytes(&content);

        if !destination.is_file() {
            file_ops::write_atomic(&destination, &content)?;
            return Ok(synced(new_hash, FileStatus::Created));
        }

        let live_hash = hash_file(&destination)?;
        if verify_hash(&new_hash, &live_hash) {
            return Ok(synced(new_hash, FileStatus::Unchanged));
        }

        if self.was_edited(&planned.destination, &live_hash) {
            let backup = file_ops::backup_file(&destination, self.now)?;
            let relative = backup
                .strip_prefix(self.root.path())
                .map(crate::path_utils::to_forward_slashes)
                .unwrap_or_else(|_| backup.display().to_string());
            info!(path = %planned.destination, backup = %relative, "Backed up modified file");
            backups.push(relative);
        }

        file_ops::write_atomic(&destination, &content)?;
        Ok(synced(new_hash, FileStatus::Updated))
    }

    /// A differing file needs a backup unless agentkit wrote exactly this
    /// content last time
    fn was_edited(&self, path: &str, live_hash: &str) -> bool {
        match self.previous.and_then(|m| m.hash_for(path)) {
            Some(recorded) => !verify_hash(recorded, live_hash),
            None => true,
        }
    }
}

/// The underlying cause of a per-file failure, without the generic wrapper
fn failure_reason(err: AgentkitError) -> String {
    match err {
        AgentkitError::FileReadFailed { path, reason } => format!("{path}: {reason}"),
        AgentkitError::FileWriteFailed { reason, .. } | AgentkitError::PathError { reason, .. } => {
            reason
        }
        other => other.to_string(),
    }
}
