//! Error types and handling for agentkit
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`root`]: Installation root errors (missing, uncreatable, locked)
//! - [`manifest`]: Manifest and version errors
//! - [`deps`]: Dependency resolution errors
//! - [`fs`]: File system errors
//!
//! Not every variant is fatal. `ManifestCorrupt` and `DependencyUnresolved` are
//! only ever rendered as warnings; the engine degrades and continues.

pub mod deps;
pub mod fs;
pub mod macros;
pub mod manifest;
pub mod root;

pub use deps::unresolved as dependency_unresolved;
pub use fs::{read_failed as file_read_failed, write_failed as file_write_failed};
pub use manifest::{corrupt as manifest_corrupt, invalid_version};
pub use root::{invalid_package_id, path_error};

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for agentkit operations
#[derive(Error, Diagnostic, Debug)]
pub enum AgentkitError {
    // Installation root errors
    #[error("Installation root unusable: {path}: {reason}")]
    #[diagnostic(
        code(agentkit::root::path_error),
        help("Check that the directory exists or can be created, or pick a different directory")
    )]
    PathError { path: String, reason: String },

    #[error("Installation root is locked by another process: {path}")]
    #[diagnostic(
        code(agentkit::root::locked),
        help("Wait for the other agentkit process to finish; concurrent runs on one root are unsupported")
    )]
    RootLocked { path: String },

    #[error("Invalid package id: {id}")]
    #[diagnostic(
        code(agentkit::root::invalid_package_id),
        help("Package ids use lowercase letters, digits and '-' only; 'agentkit-core' is reserved")
    )]
    InvalidPackageId { id: String },

    // Source tree errors
    #[error("Source not found: {what} at {path}")]
    #[diagnostic(
        code(agentkit::source::not_found),
        help("Point --source at a directory containing core/, common/ and expansion-packs/")
    )]
    SourceNotFound { what: String, path: String },

    // Manifest errors
    #[error("Manifest is corrupt: {path}: {reason}")]
    #[diagnostic(code(agentkit::manifest::corrupt))]
    ManifestCorrupt { path: String, reason: String },

    #[error("Invalid version '{input}': {reason}")]
    #[diagnostic(
        code(agentkit::manifest::invalid_version),
        help("Versions are up to three dot-separated non-negative integers, e.g. 1.3.0")
    )]
    InvalidVersion { input: String, reason: String },

    // Dependency errors
    #[error("Unresolved {kind} dependency '{name}' requested by '{requested_by}'")]
    #[diagnostic(code(agentkit::deps::unresolved))]
    DependencyUnresolved {
        kind: String,
        name: String,
        requested_by: String,
    },

    // Reconciliation errors
    #[error("Integrity mismatch in {package}: {missing} missing, {modified} modified")]
    #[diagnostic(
        code(agentkit::integrity::mismatch),
        help("Run install with --action repair to restore the recorded files")
    )]
    IntegrityMismatch {
        package: String,
        missing: usize,
        modified: usize,
    },

    #[error("Action '{action}' is not available when the root is {state}")]
    #[diagnostic(
        code(agentkit::reconcile::invalid_transition),
        help("Run 'agentkit status' to see which actions are available")
    )]
    InvalidTransition { action: String, state: String },

    #[error("Failed to write {path} after {completed} file(s) were written: {reason}")]
    #[diagnostic(
        code(agentkit::sync::write_failure),
        help("Files written so far were kept; rerun with --action repair once the cause is fixed")
    )]
    WriteFailure {
        path: String,
        completed: usize,
        reason: String,
    },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(agentkit::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(agentkit::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(agentkit::fs::io_error))]
    IoError { message: String },

    #[error("Failed to serialize {what}: {reason}")]
    #[diagnostic(code(agentkit::fs::serialize_failed))]
    SerializeFailed { what: String, reason: String },
}

impl From<std::io::Error> for AgentkitError {
    fn from(err: std::io::Error) -> Self {
        AgentkitError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for AgentkitError {
    fn from(err: walkdir::Error) -> Self {
        AgentkitError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AgentkitError {
    fn from(err: serde_json::Error) -> Self {
        AgentkitError::SerializeFailed {
            what: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, AgentkitError>;
