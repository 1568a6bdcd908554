//! Dependency kinds and their on-disk conventions

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A kind of file a resource can depend on
///
/// Each kind maps to a subdirectory of a collection and a default extension
/// appended to bare names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Agents,
    AgentTeams,
    Tasks,
    Templates,
    Checklists,
    Workflows,
    Data,
    Utils,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 8] = [
        Self::Agents,
        Self::AgentTeams,
        Self::Tasks,
        Self::Templates,
        Self::Checklists,
        Self::Workflows,
        Self::Data,
        Self::Utils,
    ];

    /// Subdirectory of a collection holding this kind
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::AgentTeams => "agent-teams",
            Self::Tasks => "tasks",
            Self::Templates => "templates",
            Self::Checklists => "checklists",
            Self::Workflows => "workflows",
            Self::Data => "data",
            Self::Utils => "utils",
        }
    }

    /// Extension appended to names declared without one
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Agents | Self::Tasks | Self::Checklists | Self::Data | Self::Utils => "md",
            Self::AgentTeams | Self::Templates | Self::Workflows => "yaml",
        }
    }

    /// Agents and teams carry their own dependencies and are expanded recursively
    pub fn is_resource(self) -> bool {
        matches!(self, Self::Agents | Self::AgentTeams)
    }

    /// Apply the default extension if `name` has none
    pub fn normalize_filename(self, name: &str) -> String {
        let name = name.trim();
        if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{name}.{}", self.default_extension())
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.dir_name() == s)
            .ok_or_else(|| format!("unknown dependency kind '{s}'"))
    }
}
