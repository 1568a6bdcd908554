//! Classify what is already at an installation root
//!
//! Detection is read-only and never fails: unreadable manifests are treated as
//! absent, and a missing root is simply clean.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;

use serde::Serialize;

use crate::collection::PackageConfig;
use crate::manifest::{Manifest, ManifestStore};
use crate::root::{
    CORE_DIR, InstallationRoot, LEGACY_DIR, LOCK_FILE, PACKAGE_CONFIG_FILE, PackageId, VCS_DIRS,
};
use crate::version::Version;

/// Classification of a root, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Clean,
    CorePresent,
    LegacyStructurePresent,
    UnrecognizedExisting,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clean => "clean",
            Self::CorePresent => "core present",
            Self::LegacyStructurePresent => "legacy structure present",
            Self::UnrecognizedExisting => "unrecognized existing",
        })
    }
}

/// An expansion package directory found at the root
#[derive(Debug, Clone, Serialize)]
pub struct DetectedPackage {
    pub id: String,

    pub has_manifest: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<Version>,

    #[serde(skip)]
    pub manifest: Option<Manifest>,

    #[serde(skip)]
    pub config: Option<PackageConfig>,
}

/// What detection found at a root
#[derive(Debug, Clone, Serialize)]
pub struct InstallationState {
    pub kind: StateKind,

    #[serde(skip)]
    pub core_manifest: Option<Manifest>,

    /// A clean root that nonetheless holds unrelated files
    pub has_other_files: bool,

    pub expansion_packages: BTreeMap<String, DetectedPackage>,
}

impl InstallationState {
    /// Version recorded by the core manifest
    pub fn installed_version(&self) -> Option<Version> {
        self.core_manifest.as_ref().map(|m| m.version)
    }
}

/// Read-only classifier for installation roots
pub struct StateDetector;

impl StateDetector {
    /// Classify a root
    ///
    /// Precedence: readable core manifest, then legacy directory, then an
    /// existing core directory without a usable manifest, then clean.
    pub fn detect(root: &InstallationRoot) -> InstallationState {
        let expansion_packages = detect_expansion_packages(root);

        if !root.exists() {
            return InstallationState {
                kind: StateKind::Clean,
                core_manifest: None,
                has_other_files: false,
                expansion_packages,
            };
        }

        let core_manifest = ManifestStore::read(root, &PackageId::Core);
        let kind = if core_manifest.is_some() {
            StateKind::CorePresent
        } else if root.path().join(LEGACY_DIR).is_dir() {
            StateKind::LegacyStructurePresent
        } else if root.path().join(CORE_DIR).is_dir() {
            StateKind::UnrecognizedExisting
        } else {
            StateKind::Clean
        };

        let has_other_files = kind == StateKind::Clean && has_entries(root);

        tracing::debug!(
            root = %root.path().display(),
            state = %kind,
            packages = expansion_packages.len(),
            "Detected installation state"
        );

        InstallationState {
            kind,
            core_manifest,
            has_other_files,
            expansion_packages,
        }
    }
}

fn has_entries(root: &InstallationRoot) -> bool {
    fs::read_dir(root.path()).is_ok_and(|entries| {
        entries
            .filter_map(std::result::Result::ok)
            .any(|e| e.file_name() != LOCK_FILE)
    })
}

/// Hidden, validly named directories holding a manifest or a package config,
/// except the core and VCS ones
fn detect_expansion_packages(root: &InstallationRoot) -> BTreeMap<String, DetectedPackage> {
    let mut packages = BTreeMap::new();
    let Ok(entries) = fs::read_dir(root.path()) else {
        return packages;
    };

    for entry in entries.filter_map(std::result::Result::ok) {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == CORE_DIR || VCS_DIRS.contains(&name.as_str()) {
            continue;
        }
        let Some(package @ PackageId::Expansion(_)) = PackageId::from_marker_dir(&name) else {
            continue;
        };

        let config_path = entry.path().join(PACKAGE_CONFIG_FILE);
        if !ManifestStore::exists(root, &package) && !config_path.is_file() {
            continue;
        }

        let manifest = ManifestStore::read(root, &package);
        let config = config_path
            .is_file()
            .then(|| PackageConfig::load(&config_path).ok())
            .flatten();

        let id = package.as_str().to_string();
        packages.insert(
            id.clone(),
            DetectedPackage {
                id,
                has_manifest: manifest.is_some(),
                installed_version: manifest.as_ref().map(|m| m.version),
                manifest,
                config,
            },
        );
    }

    packages
}
