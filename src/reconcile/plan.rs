//! Turning an install selection into the exact files a package gets
//!
//! | Install type   | Files                                                        |
//! |----------------|--------------------------------------------------------------|
//! | full           | every core file, then every common file                      |
//! | single-agent   | the agent's closure, the core `config.yaml`, common files    |
//! | team           | the team's closure, the core `config.yaml`, common files     |
//! | expansion-pack | every pack file, its agents' and teams' closures, common files |
//!
//! All destinations sit under the package's marker directory. When two
//! sources map to one destination the first one planned wins.

use serde::Serialize;

use crate::collection::{Collection, DependencyKind, SourceTree};
use crate::error::{AgentkitError, Result, manifest_corrupt};
use crate::installer::SyncPlan;
use crate::manifest::{InstallType, Manifest};
use crate::resolver::{DependencyClosure, DependencyResolver, UnresolvedReference};
use crate::root::{CORE_DIR, MANIFEST_FILE, PACKAGE_CONFIG_FILE, PackageId};
use crate::version::Version;

/// What the caller asked to install into the core package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "id")]
pub enum Selection {
    #[default]
    Full,
    Agent(String),
    Team(String),
}

impl Selection {
    pub fn install_type(&self) -> InstallType {
        match self {
            Self::Full => InstallType::Full,
            Self::Agent(_) => InstallType::SingleAgent,
            Self::Team(_) => InstallType::Team,
        }
    }

    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Full => None,
            Self::Agent(id) | Self::Team(id) => Some(id),
        }
    }

    /// The selection a manifest was installed with
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        let resource = || {
            manifest.selected_resource.clone().ok_or_else(|| {
                manifest_corrupt(
                    format!("{CORE_DIR}/{MANIFEST_FILE}"),
                    format!("{} install without selected_resource", manifest.install_type),
                )
            })
        };
        Ok(match manifest.install_type {
            InstallType::Full | InstallType::ExpansionPack => Self::Full,
            InstallType::SingleAgent => Self::Agent(resource()?),
            InstallType::Team => Self::Team(resource()?),
        })
    }
}

/// Everything needed to install one package
#[derive(Debug, Clone)]
pub struct PackagePlan {
    pub sync: SyncPlan,
    pub install_type: InstallType,
    pub selected_resource: Option<String>,
    pub version: Version,
    pub unresolved: Vec<UnresolvedReference>,
}

impl PackagePlan {
    pub fn package(&self) -> &PackageId {
        &self.sync.package
    }

    /// A manifest for this plan, without files; the caller adds them after sync
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::new(self.version, self.install_type);
        manifest.selected_resource = self.selected_resource.clone();
        manifest
    }
}

/// Builds package plans from a source tree
pub struct Planner<'a> {
    sources: &'a SourceTree,
}

impl<'a> Planner<'a> {
    pub fn new(sources: &'a SourceTree) -> Self {
        Self { sources }
    }

    /// Plan the core package
    ///
    /// # Errors
    ///
    /// Returns `SourceNotFound` if a selected agent or team does not exist.
    pub fn core(&self, selection: &Selection) -> Result<PackagePlan> {
        let package = PackageId::Core;
        let search_order = self.sources.search_order(&package)?;
        let resolver = DependencyResolver::new(&search_order);
        let core = self.sources.core();
        let mut plan = SyncPlan::new(package.clone());

        let unresolved = match selection {
            Selection::Full => {
                add_collection(&mut plan, &core);
                let closures = [
                    resolve_all(&resolver, &core, DependencyKind::Agents),
                    resolve_all(&resolver, &core, DependencyKind::AgentTeams),
                ];
                merge_unresolved(&closures)
            }
            Selection::Agent(id) | Selection::Team(id) => {
                let kind = match selection {
                    Selection::Team(_) => DependencyKind::AgentTeams,
                    _ => DependencyKind::Agents,
                };
                let closure = resolver.resolve_names(kind, &[id.as_str()]);
                if !closure.contains(kind, &kind.normalize_filename(id)) {
                    return Err(AgentkitError::SourceNotFound {
                        what: format!("{} '{id}'", kind.dir_name()),
                        path: core.root().join(kind.dir_name()).display().to_string(),
                    });
                }
                add_closure(&mut plan, &closure);
                if let Some(config) = core.locate_relative(PACKAGE_CONFIG_FILE) {
                    plan.add(
                        config,
                        destination(&package, PACKAGE_CONFIG_FILE),
                        core.id().clone(),
                    );
                }
                merge_unresolved(&[closure])
            }
        };

        if let Some(common) = self.sources.common() {
            add_collection(&mut plan, &common);
        }

        Ok(PackagePlan {
            sync: plan,
            install_type: selection.install_type(),
            selected_resource: selection.resource().map(str::to_string),
            version: self.sources.version(&package)?,
            unresolved,
        })
    }

    /// Plan an expansion package
    pub fn expansion(&self, id: &str) -> Result<PackagePlan> {
        let package = PackageId::expansion(id)?;
        let search_order = self.sources.search_order(&package)?;
        let resolver = DependencyResolver::new(&search_order);
        let pack = self.sources.expansion(id)?;
        let mut plan = SyncPlan::new(package.clone());

        add_collection(&mut plan, &pack);
        let closures = [
            resolve_all(&resolver, &pack, DependencyKind::Agents),
            resolve_all(&resolver, &pack, DependencyKind::AgentTeams),
        ];
        for closure in &closures {
            add_closure(&mut plan, closure);
        }
        if let Some(common) = self.sources.common() {
            add_collection(&mut plan, &common);
        }

        Ok(PackagePlan {
            sync: plan,
            install_type: InstallType::ExpansionPack,
            selected_resource: None,
            version: self.sources.version(&package)?,
            unresolved: merge_unresolved(&closures),
        })
    }
}

fn destination(package: &PackageId, relative: &str) -> String {
    format!("{}/{relative}", package.marker_dir())
}

fn add_collection(plan: &mut SyncPlan, collection: &Collection) {
    let package = plan.package.clone();
    for relative in collection.files() {
        plan.add(
            collection.root().join(&relative),
            destination(&package, &relative),
            collection.id().clone(),
        );
    }
}

fn add_closure(plan: &mut SyncPlan, closure: &DependencyClosure) {
    let package = plan.package.clone();
    for file in closure.iter() {
        plan.add(
            file.source.clone(),
            destination(&package, &file.relative_path()),
            file.collection.clone(),
        );
    }
}

/// Resolve every resource of one kind a collection ships
fn resolve_all(
    resolver: &DependencyResolver<'_>,
    collection: &Collection,
    kind: DependencyKind,
) -> DependencyClosure {
    let names = collection.list(kind);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    if names.is_empty() {
        return DependencyClosure::default();
    }
    resolver.resolve_names(kind, &names)
}

fn merge_unresolved(closures: &[DependencyClosure]) -> Vec<UnresolvedReference> {
    let mut unresolved: Vec<_> = closures
        .iter()
        .flat_map(|c| c.unresolved.iter().cloned())
        .collect();
    unresolved.sort();
    unresolved.dedup();
    unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::SourceFixture;

    fn destinations(plan: &PackagePlan) -> Vec<&str> {
        plan.sync
            .files()
            .iter()
            .map(|f| f.destination.as_str())
            .collect()
    }

    #[test]
    fn test_full_plan_has_core_then_common() {
        let fixture = SourceFixture::sample().file("common/data/kb.md", "shadowed by core");
        let tree = fixture.tree();
        let plan = Planner::new(&tree).core(&Selection::Full).unwrap();

        let dests = destinations(&plan);
        assert!(dests.contains(&".agentkit-core/config.yaml"));
        assert!(dests.contains(&".agentkit-core/agents/dev.md"));
        assert!(dests.contains(&".agentkit-core/utils/workflow-management.md"));
        assert!(dests.contains(&".agentkit-core/tasks/execute-checklist.md"));

        let kb = plan
            .sync
            .files()
            .iter()
            .find(|f| f.destination == ".agentkit-core/data/kb.md")
            .unwrap();
        assert!(kb.source.starts_with(tree.core().root()));
        assert_eq!(plan.install_type, InstallType::Full);
        assert_eq!(plan.version, Version::new(1, 0, 0));
        assert!(plan.unresolved.is_empty());
    }

    #[test]
    fn test_single_agent_plan() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        let plan = Planner::new(&tree)
            .core(&Selection::Agent("dev".to_string()))
            .unwrap();

        let dests = destinations(&plan);
        assert!(dests.contains(&".agentkit-core/agents/dev.md"));
        assert!(dests.contains(&".agentkit-core/tasks/create-doc.md"));
        assert!(dests.contains(&".agentkit-core/config.yaml"));
        assert!(dests.contains(&".agentkit-core/utils/workflow-management.md"));
        assert!(!dests.contains(&".agentkit-core/agents/qa.md"));
        assert_eq!(plan.selected_resource.as_deref(), Some("dev"));
        assert_eq!(plan.manifest().install_type, InstallType::SingleAgent);
    }

    #[test]
    fn test_team_plan_includes_orchestrator() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        let plan = Planner::new(&tree)
            .core(&Selection::Team("team-dev".to_string()))
            .unwrap();

        let dests = destinations(&plan);
        assert!(dests.contains(&".agentkit-core/agent-teams/team-dev.yaml"));
        assert!(dests.contains(&".agentkit-core/agents/agentkit-orchestrator.md"));
        assert!(dests.contains(&".agentkit-core/workflows/greenfield.yaml"));
    }

    #[test]
    fn test_unknown_agent_is_source_error() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        let err = Planner::new(&tree)
            .core(&Selection::Agent("ghost".to_string()))
            .unwrap_err();
        assert!(matches!(err, AgentkitError::SourceNotFound { .. }));
    }

    #[test]
    fn test_expansion_plan_pulls_core_dependencies() {
        let fixture = SourceFixture::sample();
        let tree = fixture.tree();
        let plan = Planner::new(&tree).expansion("infra").unwrap();

        let dests = destinations(&plan);
        assert!(dests.contains(&".infra/config.yaml"));
        assert!(dests.contains(&".infra/agents/infra-ops.md"));
        assert!(dests.contains(&".infra/tasks/review-infra.md"));
        assert!(dests.contains(&".infra/tasks/create-doc.md"));
        assert!(dests.contains(&".infra/utils/workflow-management.md"));
        assert!(dests.iter().all(|d| d.starts_with(".infra/")));
        assert_eq!(plan.sync.token(), ".infra");
        assert_eq!(plan.version, Version::new(0, 2, 0));
    }

    #[test]
    fn test_expansion_plan_reports_unresolved() {
        let fixture = SourceFixture::sample().file(
            "expansion-packs/infra/agents/broken.md",
            "---\ndependencies:\n  checklists:\n    - nowhere\n---\n",
        );
        let tree = fixture.tree();
        let plan = Planner::new(&tree).expansion("infra").unwrap();
        assert_eq!(plan.unresolved.len(), 1);
        assert_eq!(plan.unresolved[0].name, "nowhere");
        assert_eq!(plan.unresolved[0].requested_by, "agents/broken.md");
    }

    #[test]
    fn test_selection_from_manifest() {
        let mut manifest = Manifest::new(Version::new(1, 0, 0), InstallType::Team);
        assert!(Selection::from_manifest(&manifest).is_err());
        manifest.selected_resource = Some("team-dev".to_string());
        assert_eq!(
            Selection::from_manifest(&manifest).unwrap(),
            Selection::Team("team-dev".to_string())
        );
    }
}
