//! Source collections
//!
//! Collections are read-only directories of resource files grouped by kind.
//! A source tree bundles all of them:
//!
//! ```text
//! <source>/
//! ├── core/                   # Core package collection (config.yaml required)
//! ├── common/                 # Shared collection copied into every package
//! └── expansion-packs/
//!     └── <pack-id>/          # One collection per expansion package
//! ```
//!
//! The engine never writes into a collection.

pub mod kind;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{AgentkitError, Result, file_read_failed};
use crate::root::{MANIFEST_FILE, PACKAGE_CONFIG_FILE, PackageId, is_valid_package_id};
use crate::version::Version;

pub use kind::DependencyKind;

/// Core collection directory inside a source tree
pub const SOURCE_CORE_DIR: &str = "core";

/// Shared collection directory inside a source tree
pub const SOURCE_COMMON_DIR: &str = "common";

/// Expansion package collections directory inside a source tree
pub const SOURCE_EXPANSIONS_DIR: &str = "expansion-packs";

/// Which collection a file came from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "id")]
pub enum CollectionId {
    Core,
    Common,
    Expansion(String),
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => f.write_str("core"),
            Self::Common => f.write_str("common"),
            Self::Expansion(id) => write!(f, "expansion:{id}"),
        }
    }
}

/// `config.yaml` of a package collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    #[serde(default)]
    pub name: Option<String>,

    pub version: Version,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| file_read_failed(path, e))?;
        serde_yaml::from_str(&content).map_err(|e| file_read_failed(path, e))
    }
}

/// A directory of resource files grouped by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    id: CollectionId,
    root: PathBuf,
}

impl Collection {
    pub fn new(id: CollectionId, root: impl Into<PathBuf>) -> Self {
        Self {
            id,
            root: root.into(),
        }
    }

    pub fn id(&self) -> &CollectionId {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<kind>/<filename>` if it exists in this collection
    pub fn locate(&self, kind: DependencyKind, filename: &str) -> Option<PathBuf> {
        let path = self.root.join(kind.dir_name()).join(filename);
        path.is_file().then_some(path)
    }

    /// Path of a collection-relative, forward-slash path if it exists
    pub fn locate_relative(&self, relative: &str) -> Option<PathBuf> {
        let path = crate::path_utils::join_relative(&self.root, relative)?;
        path.is_file().then_some(path)
    }

    /// File names of one kind, sorted
    pub fn list(&self, kind: DependencyKind) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.root.join(kind.dir_name())) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Every file in the collection as a sorted, forward-slash relative path
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name() != MANIFEST_FILE)
            .filter_map(|e| {
                e.path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(crate::path_utils::to_forward_slashes)
            })
            .collect();
        files.sort();
        files
    }

    /// The collection's `config.yaml`, if it has one
    pub fn config(&self) -> Result<Option<PackageConfig>> {
        let path = self.root.join(PACKAGE_CONFIG_FILE);
        if path.is_file() {
            PackageConfig::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// The full set of source collections available to an install
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Open a source tree; its `core/` collection must exist
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let core = root.join(SOURCE_CORE_DIR);
        if !core.is_dir() {
            return Err(AgentkitError::SourceNotFound {
                what: "core collection".to_string(),
                path: core.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn core(&self) -> Collection {
        Collection::new(CollectionId::Core, self.root.join(SOURCE_CORE_DIR))
    }

    /// The shared collection, if the tree has one
    pub fn common(&self) -> Option<Collection> {
        let path = self.root.join(SOURCE_COMMON_DIR);
        path.is_dir()
            .then(|| Collection::new(CollectionId::Common, path))
    }

    /// An expansion package's collection
    pub fn expansion(&self, id: &str) -> Result<Collection> {
        let path = self.root.join(SOURCE_EXPANSIONS_DIR).join(id);
        if !is_valid_package_id(id) || !path.is_dir() {
            return Err(AgentkitError::SourceNotFound {
                what: format!("expansion package '{id}'"),
                path: path.display().to_string(),
            });
        }
        Ok(Collection::new(CollectionId::Expansion(id.to_string()), path))
    }

    /// Ids of all expansion packages in the tree, sorted
    pub fn expansion_ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.root.join(SOURCE_EXPANSIONS_DIR)) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|id| is_valid_package_id(id))
            .collect();
        ids.sort();
        ids
    }

    /// The collection that owns a package
    pub fn collection(&self, package: &PackageId) -> Result<Collection> {
        match package {
            PackageId::Core => Ok(self.core()),
            PackageId::Expansion(id) => self.expansion(id),
        }
    }

    /// Version available for a package, from its collection's `config.yaml`
    pub fn version(&self, package: &PackageId) -> Result<Version> {
        let collection = self.collection(package)?;
        collection
            .config()?
            .map(|config| config.version)
            .ok_or_else(|| AgentkitError::SourceNotFound {
                what: format!("{PACKAGE_CONFIG_FILE} for {package}"),
                path: collection.root().display().to_string(),
            })
    }

    /// Collections searched for a package's dependencies, highest priority first:
    /// the owning package, then core, then common
    pub fn search_order(&self, package: &PackageId) -> Result<Vec<Collection>> {
        let mut order = vec![self.collection(package)?];
        if *package != PackageId::Core {
            order.push(self.core());
        }
        order.extend(self.common());
        Ok(order)
    }
}
