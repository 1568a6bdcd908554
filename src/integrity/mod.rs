//! Integrity checks of installed packages against their manifests
//!
//! Each recorded file is classified as present and intact, missing, or
//! modified. Manifests carry a hash per file, so the check is a streaming
//! hash of the live file. Entries without a hash are checked by rendering
//! their source again, found from the path: the first component names the
//! package and the rest is the path inside its collections.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::collection::SourceTree;
use crate::error::{AgentkitError, Result};
use crate::hash::{hash_bytes, hash_file, verify_hash};
use crate::installer::render;
use crate::manifest::Manifest;
use crate::path_utils::split_first_component;
use crate::root::{InstallationRoot, PackageId};

/// Discrepancies between a manifest and the files on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub missing: Vec<String>,
    pub modified: Vec<String>,
    /// Recorded files with no hash and no source to compare against
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unverifiable: Vec<String>,
}

impl IntegrityReport {
    /// No missing and no modified files
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.modified.is_empty()
    }

    /// The report as an error, or `Ok` when clean
    pub fn into_result(self, package: &PackageId) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(AgentkitError::IntegrityMismatch {
                package: package.to_string(),
                missing: self.missing.len(),
                modified: self.modified.len(),
            })
        }
    }
}

/// Compares manifests to files under a root
pub struct IntegrityChecker<'a> {
    root: &'a InstallationRoot,
    sources: Option<&'a SourceTree>,
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(root: &'a InstallationRoot) -> Self {
        Self {
            root,
            sources: None,
        }
    }

    /// Sources used to verify entries recorded without a hash
    pub fn with_sources(mut self, sources: &'a SourceTree) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Check every file a manifest records
    pub fn check(&self, manifest: &Manifest) -> IntegrityReport {
        let mut report = IntegrityReport::default();

        for entry in &manifest.files {
            let live = match self.root.resolve(&entry.path) {
                Ok(live) => live,
                Err(err) => {
                    warn!(path = %entry.path, "{err}; cannot verify file");
                    report.unverifiable.push(entry.path.clone());
                    continue;
                }
            };
            if !live.is_file() {
                report.missing.push(entry.path.clone());
                continue;
            }

            let live_hash = match hash_file(&live) {
                Ok(hash) => hash,
                Err(err) => {
                    warn!(path = %entry.path, "{err}; cannot verify file");
                    report.unverifiable.push(entry.path.clone());
                    continue;
                }
            };

            let expected = match &entry.hash {
                Some(hash) => Some(hash.clone()),
                None => self.expected_hash(&entry.path),
            };

            match expected {
                Some(expected) if verify_hash(&expected, &live_hash) => {}
                Some(_) => report.modified.push(entry.path.clone()),
                None => report.unverifiable.push(entry.path.clone()),
            }
        }

        debug!(
            missing = report.missing.len(),
            modified = report.modified.len(),
            unverifiable = report.unverifiable.len(),
            "Checked integrity"
        );
        report
    }

    /// Hash of what agentkit would install at `relative` from current sources
    fn expected_hash(&self, relative: &str) -> Option<String> {
        let (package, source) = self.provenance(relative)?;
        match render::render(&source, &package.marker_dir()) {
            Ok(content) => Some(hash_bytes(&content)),
            Err(err) => {
                warn!(path = %relative, "{err}; cannot re-derive expected content");
                None
            }
        }
    }

    /// Package and source file an installed path was copied from
    pub fn provenance(&self, relative: &str) -> Option<(PackageId, PathBuf)> {
        let sources = self.sources?;
        let (marker, rest) = split_first_component(relative)?;
        let package = PackageId::from_marker_dir(marker)?;
        let source = sources
            .search_order(&package)
            .ok()?
            .iter()
            .find_map(|collection| collection.locate_relative(rest))?;
        Some((package, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{InstallType, ManifestFile};
    use crate::test_fixtures::{SourceFixture, create_root, write_file};
    use crate::version::Version;

    fn manifest(files: Vec<ManifestFile>) -> Manifest {
        let mut manifest = Manifest::new(Version::new(1, 0, 0), InstallType::Full);
        manifest.files = files;
        manifest
    }

    fn hashed(path: &str, content: &str) -> ManifestFile {
        ManifestFile::new(path, hash_bytes(content.as_bytes()))
    }

    fn unhashed(path: &str) -> ManifestFile {
        ManifestFile {
            path: path.to_string(),
            hash: None,
        }
    }

    #[test]
    fn test_clean_install() {
        let (_temp, root) = create_root();
        write_file(root.path(), ".agentkit-core/tasks/a.md", "a");
        let report =
            IntegrityChecker::new(&root).check(&manifest(vec![hashed(".agentkit-core/tasks/a.md", "a")]));
        assert!(report.is_clean());
        assert!(report.into_result(&PackageId::Core).is_ok());
    }

    #[test]
    fn test_missing_and_modified_are_distinguished() {
        let (_temp, root) = create_root();
        write_file(root.path(), ".agentkit-core/tasks/a.md", "a");
        write_file(root.path(), ".agentkit-core/tasks/b.md", "edited");

        let report = IntegrityChecker::new(&root).check(&manifest(vec![
            hashed(".agentkit-core/tasks/a.md", "a"),
            hashed(".agentkit-core/tasks/b.md", "b"),
            hashed(".agentkit-core/tasks/c.md", "c"),
        ]));

        assert_eq!(report.missing, vec![".agentkit-core/tasks/c.md"]);
        assert_eq!(report.modified, vec![".agentkit-core/tasks/b.md"]);
        let err = report.into_result(&PackageId::Core).unwrap_err();
        assert!(matches!(
            err,
            AgentkitError::IntegrityMismatch {
                missing: 1,
                modified: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_unhashed_entry_verified_against_source() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        let (_temp, root) = create_root();
        write_file(
            root.path(),
            ".agentkit-core/tasks/create-doc.md",
            "# Create doc\n\nLoad .agentkit-core/templates/story-tmpl.yaml first.\n",
        );
        write_file(root.path(), ".agentkit-core/tasks/review-story.md", "changed\n");
        write_file(
            root.path(),
            ".agentkit-core/utils/workflow-management.md",
            "# Workflow management\n",
        );

        let report = IntegrityChecker::new(&root).with_sources(&tree).check(&manifest(vec![
            unhashed(".agentkit-core/tasks/create-doc.md"),
            unhashed(".agentkit-core/tasks/review-story.md"),
            unhashed(".agentkit-core/utils/workflow-management.md"),
        ]));

        assert!(report.missing.is_empty());
        assert_eq!(report.modified, vec![".agentkit-core/tasks/review-story.md"]);
        assert!(report.unverifiable.is_empty());
    }

    #[test]
    fn test_unhashed_entry_without_source_is_unverifiable() {
        let (_temp, root) = create_root();
        write_file(root.path(), ".agentkit-core/tasks/a.md", "a");
        let report = IntegrityChecker::new(&root)
            .check(&manifest(vec![unhashed(".agentkit-core/tasks/a.md")]));
        assert!(report.is_clean());
        assert_eq!(report.unverifiable, vec![".agentkit-core/tasks/a.md"]);
    }

    #[test]
    fn test_provenance_uses_package_search_order() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        let (_temp, root) = create_root();
        let checker = IntegrityChecker::new(&root).with_sources(&tree);

        let (package, source) = checker.provenance(".infra/tasks/create-doc.md").unwrap();
        assert_eq!(package, PackageId::expansion("infra").unwrap());
        assert!(source.starts_with(tree.core().root()));

        assert!(checker.provenance("loose.md").is_none());
        assert!(checker.provenance(".unknown-pack/tasks/a.md").is_none());
    }
}
