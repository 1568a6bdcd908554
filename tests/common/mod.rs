//! Common test utilities for agentkit integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

use agentkit::collection::SourceTree;
use agentkit::root::InstallationRoot;

/// A source tree and an installation root side by side in one temp directory
pub struct TestWorkspace {
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Source tree root (`core/`, `common/`, `expansion-packs/`)
    pub source: PathBuf,
    /// Installation root, created by the first install
    pub project: PathBuf,
}

impl TestWorkspace {
    /// Create an empty workspace
    pub fn new() -> Self {
        let temp = TempDir::new_in(agentkit::temp::temp_dir_base())
            .expect("Failed to create temp directory");
        let source = temp.path().join("dist");
        let project = temp.path().join("project");
        std::fs::create_dir_all(&source).expect("Failed to create source directory");
        Self {
            temp,
            source,
            project,
        }
    }

    /// A workspace whose source tree holds a core package at `version`,
    /// a common collection and one expansion package
    pub fn with_sample_source(version: &str) -> Self {
        let ws = Self::new();
        ws.write_source("core/config.yaml", &format!("version: {version}\n"));
        ws.write_source(
            "core/agents/dev.md",
            "---\nagent:\n  id: dev\ndependencies:\n  tasks:\n    - create-doc\n  data:\n    - kb.md\n---\n\n# Developer\n",
        );
        ws.write_source(
            "core/agents/agentkit-orchestrator.md",
            "---\nagent:\n  id: agentkit-orchestrator\n---\n\n# Orchestrator\n",
        );
        ws.write_source(
            "core/agent-teams/team-all.yaml",
            "bundle:\n  name: Everyone\nagents:\n  - '*'\n",
        );
        ws.write_source(
            "core/tasks/create-doc.md",
            "# Create doc\n\nRead {root}/data/kb.md\n",
        );
        ws.write_source("core/data/kb.md", "# Knowledge base\n");
        ws.write_source("common/utils/shared.md", "# Shared\n");
        ws.write_source("expansion-packs/infra/config.yaml", "version: 0.1.0\n");
        ws.write_source(
            "expansion-packs/infra/agents/infra-ops.md",
            "---\nagent:\n  id: infra-ops\ndependencies:\n  tasks:\n    - create-doc\n---\n",
        );
        ws
    }

    pub fn write_source(&self, path: &str, content: &str) {
        write(&self.source.join(path), content);
    }

    pub fn write_project(&self, path: &str, content: &str) {
        write(&self.project.join(path), content);
    }

    pub fn read_project(&self, path: &str) -> String {
        std::fs::read_to_string(self.project.join(path)).expect("Failed to read file")
    }

    pub fn project_exists(&self, path: &str) -> bool {
        self.project.join(path).exists()
    }

    #[allow(dead_code)]
    pub fn tree(&self) -> SourceTree {
        SourceTree::open(&self.source).expect("Failed to open source tree")
    }

    #[allow(dead_code)]
    pub fn root(&self) -> InstallationRoot {
        InstallationRoot::new(&self.project)
    }

    /// Backup files anywhere under the project
    #[allow(dead_code)]
    pub fn backups(&self) -> Vec<String> {
        let mut found: Vec<String> = walkdir::WalkDir::new(&self.project)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
            .map(|e| relative(&self.project, e.path()))
            .collect();
        found.sort();
        found
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

fn relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// The agentkit binary with logging quiet and no inherited targets
#[allow(dead_code)]
pub fn agentkit_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_agentkit"));
    cmd.env_remove("AGENTKIT_SOURCE")
        .env_remove("AGENTKIT_DIR")
        .env_remove("RUST_LOG");
    cmd
}
