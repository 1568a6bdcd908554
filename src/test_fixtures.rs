//! Test fixtures shared by unit tests
//!
//! ```ignore
//! use crate::test_fixtures::{SourceFixture, create_temp_dir};
//!
//! let temp = create_temp_dir();
//! let fixture = SourceFixture::sample();
//! let tree = fixture.tree();
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::collection::SourceTree;
use crate::root::InstallationRoot;

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// Write `content` to `base/relative`, creating parent directories
///
/// # Panics
///
/// Panics if any file cannot be created.
pub fn write_file(base: &Path, relative: &str, content: impl AsRef<[u8]>) {
    let path = crate::path_utils::join_relative(base, relative).expect("Path leaves base");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
}

/// Builder for a source tree on disk
pub struct SourceFixture {
    temp: TempDir,
}

impl SourceFixture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp: create_temp_dir(),
        }
    }

    /// Add a file, path relative to the source tree root
    #[must_use]
    pub fn file(self, relative: &str, content: &str) -> Self {
        write_file(self.temp.path(), relative, content);
        self
    }

    /// Add a binary file
    #[must_use]
    pub fn bytes(self, relative: &str, content: &[u8]) -> Self {
        write_file(self.temp.path(), relative, content);
        self
    }

    /// Open the tree
    ///
    /// # Panics
    ///
    /// Panics if the fixture has no `core/` collection.
    #[must_use]
    pub fn tree(&self) -> SourceTree {
        SourceTree::open(self.temp.path()).expect("Failed to open source fixture")
    }

    /// A small but complete tree: core 1.0.0 with two agents, the
    /// orchestrator and one team, a common collection, and an `infra`
    /// expansion package at 0.2.0
    #[must_use]
    pub fn sample() -> Self {
        Self::new()
            .file("core/config.yaml", "name: agentkit-core\nversion: 1.0.0\n")
            .file(
                "core/agents/dev.md",
                "# Developer\n\n```yaml\nagent:\n  id: dev\n  title: Developer\ndependencies:\n  tasks:\n    - create-doc\n  templates:\n    - story-tmpl.yaml\n  checklists:\n    - story-dod-checklist\n```\n",
            )
            .file(
                "core/agents/qa.md",
                "---\nagent:\n  id: qa\ndependencies:\n  tasks:\n    - review-story.md\n  data:\n    - technical-preferences.md\n---\n\n# QA\n",
            )
            .file(
                "core/agents/agentkit-orchestrator.md",
                "---\nagent:\n  id: agentkit-orchestrator\ndependencies:\n  data:\n    - kb.md\n  utils:\n    - workflow-management.md\n---\n\n# Orchestrator\n",
            )
            .file(
                "core/agent-teams/team-dev.yaml",
                "bundle:\n  name: Dev Team\nagents:\n  - dev\n  - qa\nworkflows:\n  - greenfield.yaml\n",
            )
            .file(
                "core/tasks/create-doc.md",
                "# Create doc\n\nLoad {root}/templates/story-tmpl.yaml first.\n",
            )
            .file("core/tasks/review-story.md", "# Review story\n")
            .file("core/templates/story-tmpl.yaml", "template:\n  output: {root}/stories\n")
            .file("core/checklists/story-dod-checklist.md", "- [ ] done\n")
            .file("core/data/technical-preferences.md", "# Preferences\n")
            .file("core/data/kb.md", "# Knowledge base\n")
            .file("core/workflows/greenfield.yaml", "workflow:\n  id: greenfield\n")
            .file("common/utils/workflow-management.md", "# Workflow management\n")
            .file("common/tasks/execute-checklist.md", "Run {root}/checklists/*.md\n")
            .file("expansion-packs/infra/config.yaml", "name: infra\nversion: 0.2.0\n")
            .file(
                "expansion-packs/infra/agents/infra-ops.md",
                "---\nagent:\n  id: infra-ops\ndependencies:\n  tasks:\n    - review-infra\n    - create-doc\n---\n\n# Infra ops\n",
            )
            .file("expansion-packs/infra/tasks/review-infra.md", "See {root}/data/infra-kb.md\n")
            .file("expansion-packs/infra/data/infra-kb.md", "# Infra KB\n")
    }
}

impl Default for SourceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// An installation root inside its own temp directory
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_root() -> (TempDir, InstallationRoot) {
    let temp = create_temp_dir();
    let root = InstallationRoot::new(temp.path().join("project"));
    (temp, root)
}

/// Every file under `dir` as sorted, forward-slash relative paths
#[must_use]
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(dir)
                .ok()
                .map(crate::path_utils::to_forward_slashes)
        })
        .collect();
    files.sort();
    files
}

/// Path of a nested directory, created
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn create_nested_dir(temp: &TempDir, path: &str) -> PathBuf {
    let nested = temp.path().join(path);
    std::fs::create_dir_all(&nested).expect("Failed to create nested directory");
    nested
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temp_dir() {
        let temp = create_temp_dir();
        assert!(temp.path().exists());
    }

    #[test]
    fn test_sample_tree_opens() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        assert!(tree.common().is_some());
        assert_eq!(tree.expansion_ids(), vec!["infra"]);
    }

    #[test]
    fn test_list_files() {
        let temp = create_temp_dir();
        let nested = create_nested_dir(&temp, "a/b");
        write_file(&nested, "c.md", "c");
        write_file(temp.path(), "top.md", "t");
        assert_eq!(list_files(temp.path()), vec!["a/b/c.md", "top.md"]);
    }
}
