//! Manifest persistence, one manifest per package per root

use tracing::warn;

use crate::error::{Result, manifest_corrupt};
use crate::installer::file_ops;
use crate::root::{InstallationRoot, PackageId};

use super::Manifest;

/// Typed reads and atomic writes of `install-manifest.yaml`
pub struct ManifestStore;

impl ManifestStore {
    /// Read a package's manifest
    ///
    /// A missing manifest is `None`. So is an unreadable or corrupt one: that
    /// case is logged as a warning and degrades detection instead of aborting.
    pub fn read(root: &InstallationRoot, package: &PackageId) -> Option<Manifest> {
        match Self::try_read(root, package) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(package = %package, "{err}; treating manifest as absent");
                None
            }
        }
    }

    /// Read a package's manifest, surfacing corruption as `ManifestCorrupt`
    pub fn try_read(root: &InstallationRoot, package: &PackageId) -> Result<Option<Manifest>> {
        let path = root.manifest_path(package);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| manifest_corrupt(path.display().to_string(), e.to_string()))?;
        let manifest = serde_yaml::from_str(&content)
            .map_err(|e| manifest_corrupt(path.display().to_string(), e.to_string()))?;
        Ok(Some(manifest))
    }

    /// Whether a manifest file exists, readable or not
    pub fn exists(root: &InstallationRoot, package: &PackageId) -> bool {
        root.manifest_path(package).is_file()
    }

    /// Replace a package's manifest atomically
    ///
    /// Callers pass the complete file list; the previous manifest is
    /// overwritten, never merged.
    pub fn write(root: &InstallationRoot, package: &PackageId, manifest: &Manifest) -> Result<()> {
        let path = root.manifest_path(package);
        let yaml = serde_yaml::to_string(manifest).map_err(|e| {
            crate::error::AgentkitError::SerializeFailed {
                what: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        file_ops::write_atomic(&path, yaml.as_bytes())
    }
}
