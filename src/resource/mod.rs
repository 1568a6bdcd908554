//! Resource descriptors
//!
//! A **resource** is an agent or a team. Unlike plain dependency files, a
//! resource declares what else it needs in an embedded metadata block:
//!
//! ```yaml
//! agent:
//!   id: dev
//! dependencies:
//!   tasks:
//!     - create-doc
//!   templates:
//!     - story-tmpl.yaml
//! ```
//!
//! Teams are YAML files listing agents and workflows. Every team implicitly
//! depends on the orchestrator agent.

pub mod metadata;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::collection::{CollectionId, DependencyKind};
use crate::error::Result;
use crate::file_error_context;

/// Agent every team pulls in, whether it lists it or not
pub const ORCHESTRATOR_AGENT: &str = "agentkit-orchestrator";

/// A dependency list as written: a list, a single name, or empty
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum NameList {
    #[default]
    Empty,
    One(String),
    Many(Vec<String>),
}

impl NameList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Empty => Vec::new(),
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    agent: Option<RawIdentity>,

    #[serde(default)]
    bundle: Option<RawIdentity>,

    #[serde(default)]
    agents: Option<NameList>,

    #[serde(default)]
    workflows: Option<NameList>,

    #[serde(default)]
    dependencies: BTreeMap<String, Option<NameList>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdentity {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    title: Option<String>,
}

/// A parsed agent or team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// `Agents` or `AgentTeams`
    pub kind: DependencyKind,

    /// File name inside the kind directory, e.g. `dev.md`
    pub filename: String,

    /// Collection the resource was loaded from
    pub collection: CollectionId,

    /// Absolute path of the resource file
    pub source: PathBuf,

    pub title: Option<String>,

    /// Declared dependencies by kind, in declaration order without duplicates
    pub dependencies: BTreeMap<DependencyKind, Vec<String>>,

    /// Dependencies under kinds agentkit does not know, by kind name
    pub unknown_kinds: BTreeMap<String, Vec<String>>,
}

impl ResourceDescriptor {
    /// Id of the resource, its file name without extension
    pub fn id(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }

    /// `kind/filename`, the name dependants and warnings refer to it by
    pub fn reference(&self) -> String {
        format!("{}/{}", self.kind.dir_name(), self.filename)
    }

    /// Load and parse a resource file
    ///
    /// The outer `Result` fails when the file cannot be read. The inner one
    /// carries the reason when its metadata is malformed.
    pub fn load(
        kind: DependencyKind,
        collection: CollectionId,
        source: &Path,
    ) -> Result<std::result::Result<Self, String>> {
        let content = std::fs::read_to_string(source)
            .map_err(|e| file_error_context!("Failed to read resource", source.display(), e))?;
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::parse(kind, &filename, collection, source, &content))
    }

    /// Parse resource content
    pub fn parse(
        kind: DependencyKind,
        filename: &str,
        collection: CollectionId,
        source: &Path,
        content: &str,
    ) -> std::result::Result<Self, String> {
        let whole_file_is_yaml = matches!(
            Path::new(filename).extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let raw = match metadata::extract(content, whole_file_is_yaml)? {
            Some(value) => serde_yaml::from_value::<RawMetadata>(value).map_err(|e| e.to_string())?,
            None => RawMetadata::default(),
        };

        let mut descriptor = Self {
            kind,
            filename: filename.to_string(),
            collection,
            source: source.to_path_buf(),
            title: None,
            dependencies: BTreeMap::new(),
            unknown_kinds: BTreeMap::new(),
        };

        let identity = raw.agent.or(raw.bundle);
        descriptor.title = identity.and_then(|i| i.title.or(i.name));

        if kind == DependencyKind::AgentTeams {
            descriptor.add(DependencyKind::Agents, vec![ORCHESTRATOR_AGENT.to_string()]);
            descriptor.add(
                DependencyKind::Agents,
                raw.agents.unwrap_or_default().into_vec(),
            );
            descriptor.add(
                DependencyKind::Workflows,
                raw.workflows.unwrap_or_default().into_vec(),
            );
        }

        for (kind_name, names) in raw.dependencies {
            let names = names.unwrap_or_default().into_vec();
            match kind_name.parse::<DependencyKind>() {
                Ok(dep_kind) => descriptor.add(dep_kind, names),
                Err(_) => {
                    descriptor.unknown_kinds.insert(kind_name, names);
                }
            }
        }

        Ok(descriptor)
    }

    fn add(&mut self, kind: DependencyKind, names: Vec<String>) {
        let entry = self.dependencies.entry(kind).or_default();
        for name in names {
            let name = name.trim().to_string();
            if !name.is_empty() && !entry.contains(&name) {
                entry.push(name);
            }
        }
        if entry.is_empty() {
            self.dependencies.remove(&kind);
        }
    }

    /// Every declared dependency as `(kind, name)` pairs
    pub fn declared(&self) -> impl Iterator<Item = (DependencyKind, &str)> {
        self.dependencies
            .iter()
            .flat_map(|(kind, names)| names.iter().map(move |n| (*kind, n.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: DependencyKind, filename: &str, content: &str) -> ResourceDescriptor {
        ResourceDescriptor::parse(
            kind,
            filename,
            CollectionId::Core,
            Path::new("/src/core/x"),
            content,
        )
        .unwrap()
    }

    #[test]
    fn test_agent_with_fenced_metadata() {
        let d = parse(
            DependencyKind::Agents,
            "dev.md",
            "# Dev\n\n```yaml\nagent:\n  title: Developer\ndependencies:\n  tasks:\n    - create-doc\n    - create-doc\n  templates: story-tmpl.yaml\n  checklists:\n```\n",
        );
        assert_eq!(d.id(), "dev");
        assert_eq!(d.reference(), "agents/dev.md");
        assert_eq!(d.title.as_deref(), Some("Developer"));
        assert_eq!(d.dependencies[&DependencyKind::Tasks], vec!["create-doc"]);
        assert_eq!(
            d.dependencies[&DependencyKind::Templates],
            vec!["story-tmpl.yaml"]
        );
        assert!(!d.dependencies.contains_key(&DependencyKind::Checklists));
    }

    #[test]
    fn test_agent_without_metadata_has_no_dependencies() {
        let d = parse(DependencyKind::Agents, "plain.md", "# Plain agent\n");
        assert!(d.dependencies.is_empty());
        assert_eq!(d.declared().count(), 0);
    }

    #[test]
    fn test_unknown_kinds_are_collected() {
        let d = parse(
            DependencyKind::Agents,
            "dev.md",
            "---\ndependencies:\n  skills:\n    - x\n  tasks:\n    - a\n---\n",
        );
        assert_eq!(d.unknown_kinds["skills"], vec!["x"]);
        assert_eq!(d.declared().collect::<Vec<_>>(), vec![(DependencyKind::Tasks, "a")]);
    }

    #[test]
    fn test_team_injects_orchestrator() {
        let d = parse(
            DependencyKind::AgentTeams,
            "team-dev.yaml",
            "bundle:\n  name: Dev Team\nagents:\n  - dev\n  - agentkit-orchestrator\nworkflows:\n  - greenfield.yaml\n",
        );
        assert_eq!(d.title.as_deref(), Some("Dev Team"));
        assert_eq!(
            d.dependencies[&DependencyKind::Agents],
            vec![ORCHESTRATOR_AGENT, "dev"]
        );
        assert_eq!(
            d.dependencies[&DependencyKind::Workflows],
            vec!["greenfield.yaml"]
        );
    }

    #[test]
    fn test_team_with_wildcard_agents() {
        let d = parse(DependencyKind::AgentTeams, "team-all.yaml", "agents:\n  - '*'\n");
        assert_eq!(
            d.dependencies[&DependencyKind::Agents],
            vec![ORCHESTRATOR_AGENT, "*"]
        );
    }

    #[test]
    fn test_malformed_metadata_is_error() {
        let err = ResourceDescriptor::parse(
            DependencyKind::Agents,
            "bad.md",
            CollectionId::Core,
            Path::new("/x"),
            "---\ndependencies:\n  tasks: {a: [\n---\n",
        )
        .unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_error() {
        let result = ResourceDescriptor::parse(
            DependencyKind::Agents,
            "bad.md",
            CollectionId::Core,
            Path::new("/x"),
            "---\ndependencies:\n  tasks:\n    nested: map\n---\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = ResourceDescriptor::load(
            DependencyKind::Agents,
            CollectionId::Core,
            Path::new("/definitely/missing/agent.md"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::AgentkitError::FileReadFailed { .. }
        ));
    }
}
