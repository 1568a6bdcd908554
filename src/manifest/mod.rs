//! Install manifests (`install-manifest.yaml`)
//!
//! A manifest records what agentkit wrote for one package in one root. It is
//! the only source of truth for later integrity checks, so it is rewritten in
//! full after every successful sync and never patched in place.

pub mod store;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::version::Version;

pub use store::ManifestStore;

/// How a package was installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallType {
    Full,
    SingleAgent,
    Team,
    ExpansionPack,
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::SingleAgent => "single-agent",
            Self::Team => "team",
            Self::ExpansionPack => "expansion-pack",
        })
    }
}

/// One installed file, relative to the installation root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFile {
    /// Forward-slash path, e.g. `.agentkit-core/tasks/create-doc.md`
    pub path: String,

    /// Content hash as written; absent in manifests from older installs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl ManifestFile {
    pub fn new(path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: Some(hash.into()),
        }
    }
}

// Older manifests list bare paths; newer ones carry a hash per entry.
impl<'de> Deserialize<'de> for ManifestFile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Path(String),
            Entry {
                path: String,
                #[serde(default)]
                hash: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Path(path) => Self { path, hash: None },
            Raw::Entry { path, hash } => Self { path, hash },
        })
    }
}

/// Record of one package installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: Version,

    pub install_type: InstallType,

    pub installed_at: DateTime<Utc>,

    /// Agent or team id for single-agent and team installs
    #[serde(default)]
    pub selected_resource: Option<String>,

    /// IDE integrations configured by the caller at install time
    #[serde(default)]
    pub ides_setup: BTreeSet<String>,

    #[serde(default)]
    pub files: Vec<ManifestFile>,
}

impl Manifest {
    /// Start a manifest stamped with the current time
    pub fn new(version: Version, install_type: InstallType) -> Self {
        Self {
            version,
            install_type,
            installed_at: Utc::now().trunc_subsecs(0),
            selected_resource: None,
            ides_setup: BTreeSet::new(),
            files: Vec::new(),
        }
    }

    /// Look up the recorded hash for a path
    pub fn hash_for(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .and_then(|f| f.hash.as_deref())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}
