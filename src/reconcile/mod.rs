//! Reconciliation of an installation root against a source tree
//!
//! This module handles:
//! - Assessing a root: detected state, versions, integrity, available actions
//! - Executing one chosen action end to end
//!
//! Per package the order is fixed: plan and resolve, check integrity (repair),
//! back up and write files, then write the manifest last. A manifest is never
//! written for a package whose sync did not complete.

pub mod action;
pub mod plan;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::collection::SourceTree;
use crate::error::{AgentkitError, Result, path_error};
use crate::installer::{FileSyncEngine, SyncMode, SyncReport};
use crate::integrity::{IntegrityChecker, IntegrityReport};
use crate::manifest::{InstallType, Manifest, ManifestStore};
use crate::resolver::UnresolvedReference;
use crate::root::detection::{InstallationState, StateDetector, StateKind};
use crate::root::{InstallationRoot, LEGACY_DIR, PackageId};
use crate::ui::ProgressReporter;
use crate::version::Version;

pub use action::{Action, Findings, available_actions, recommend};
pub use plan::{PackagePlan, Planner, Selection};

/// What the caller wants installed
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub selection: Selection,
    pub expansion_packs: Vec<String>,
    pub ides: BTreeSet<String>,
    pub mode: SyncMode,
}

/// A root's current state and what can be done about it
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub root: String,
    pub state: InstallationState,
    pub installed_version: Option<Version>,
    pub available_version: Version,
    pub core_integrity: Option<IntegrityReport>,
    pub expansion_integrity: BTreeMap<String, IntegrityReport>,
    /// Installed expansion packages with a newer version in the sources
    pub expansion_updates: BTreeMap<String, Version>,
    pub available_actions: Vec<Action>,
    pub recommended: Action,
}

/// Result of installing one package
#[derive(Debug, Clone, Serialize)]
pub struct PackageOutcome {
    pub package: String,
    pub version: Version,
    pub install_type: InstallType,
    /// Integrity findings that prompted a repair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repaired: Option<IntegrityReport>,
    pub sync: SyncReport,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Result of executing an action
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub action: Action,
    pub packages: Vec<PackageOutcome>,
    /// Where a migrated legacy directory was moved to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_backup: Option<String>,
}

impl Outcome {
    fn empty(action: Action) -> Self {
        Self {
            action,
            packages: Vec::new(),
            legacy_backup: None,
        }
    }
}

/// Integrity and version findings for everything installed at a root
struct Survey {
    core_integrity: Option<IntegrityReport>,
    expansion_integrity: BTreeMap<String, IntegrityReport>,
    expansion_updates: BTreeMap<String, Version>,
    findings: Findings,
}

struct Pending {
    plan: PackagePlan,
    previous: Option<Manifest>,
    ides: BTreeSet<String>,
    repaired: Option<IntegrityReport>,
}

/// Drives detection, planning and syncing for one root
pub struct Reconciler<'a> {
    root: &'a InstallationRoot,
    sources: &'a SourceTree,
}

impl<'a> Reconciler<'a> {
    pub fn new(root: &'a InstallationRoot, sources: &'a SourceTree) -> Self {
        Self { root, sources }
    }

    pub fn detect(&self) -> InstallationState {
        StateDetector::detect(self.root)
    }

    fn checker(&self) -> IntegrityChecker<'a> {
        IntegrityChecker::new(self.root).with_sources(self.sources)
    }

    /// Inspect the root without changing it
    pub fn assess(&self, request: &InstallRequest) -> Result<Assessment> {
        let state = self.detect();
        let available = self.sources.version(&PackageId::Core)?;
        let survey = self.survey(&state, request);

        let available_actions = available_actions(&state, available);
        let recommended = recommend(&state, available, &survey.findings);

        Ok(Assessment {
            root: self.root.path().display().to_string(),
            installed_version: state.installed_version(),
            available_version: available,
            state,
            core_integrity: survey.core_integrity,
            expansion_integrity: survey.expansion_integrity,
            expansion_updates: survey.expansion_updates,
            available_actions,
            recommended,
        })
    }

    /// Check every installed package against its manifest and the sources
    fn survey(&self, state: &InstallationState, request: &InstallRequest) -> Survey {
        let checker = self.checker();
        let in_sources: BTreeSet<String> = self.sources.expansion_ids().into_iter().collect();

        let core_integrity = state.core_manifest.as_ref().map(|m| checker.check(m));
        let expansion_integrity: BTreeMap<String, IntegrityReport> = state
            .expansion_packages
            .iter()
            .filter_map(|(id, pack)| {
                pack.manifest
                    .as_ref()
                    .map(|m| (id.clone(), checker.check(m)))
            })
            .collect();

        let expansion_updates: BTreeMap<String, Version> = state
            .expansion_packages
            .iter()
            .filter(|(id, _)| in_sources.contains(*id))
            .filter_map(|(id, pack)| {
                let installed = pack.installed_version?;
                let package = PackageId::expansion(id).ok()?;
                let newer = self.sources.version(&package).ok()?;
                (newer > installed).then(|| (id.clone(), newer))
            })
            .collect();

        let findings = Findings {
            core_drifted: core_integrity.as_ref().is_some_and(|r| !r.is_clean()),
            drifted_packs: expansion_integrity
                .iter()
                .filter(|(id, report)| in_sources.contains(*id) && !report.is_clean())
                .map(|(id, _)| id.clone())
                .collect(),
            outdated_packs: expansion_updates.keys().cloned().collect(),
            wants_expansion_packs: !request.expansion_packs.is_empty(),
        };

        Survey {
            core_integrity,
            expansion_integrity,
            expansion_updates,
            findings,
        }
    }

    /// Execute an action
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the action is not available from the detected state
    /// - `RootLocked` if another process holds the root
    /// - `SourceNotFound` if a selected resource or package is missing; this is
    ///   checked for every package before any file is written
    /// - `WriteFailure` if a file cannot be written; that package's manifest is
    ///   left as it was and later packages are not attempted
    pub fn execute(
        &self,
        action: Action,
        request: &InstallRequest,
        mut progress: Option<&mut dyn ProgressReporter>,
    ) -> Result<Outcome> {
        let state = self.detect();
        let available = self.sources.version(&PackageId::Core)?;
        if !available_actions(&state, available).contains(&action) {
            return Err(AgentkitError::InvalidTransition {
                action: action.to_string(),
                state: state.kind.to_string(),
            });
        }

        if action.is_no_op() {
            info!(%action, "Nothing to do");
            return Ok(Outcome::empty(action));
        }

        let _guard = self.root.lock()?;
        let now = Utc::now();
        let pending = self.plan(action, request, &state)?;

        let mut outcome = Outcome::empty(action);
        if action == Action::Migrate {
            outcome.legacy_backup = Some(self.move_legacy_aside(now)?);
        }

        let mode = if action == Action::Repair {
            SyncMode::Overwrite
        } else {
            request.mode
        };

        let total = pending.len();
        for (index, pending) in pending.into_iter().enumerate() {
            let package = pending.plan.package().clone();
            if let Some(progress) = progress.as_deref_mut() {
                progress.start_package(
                    package.as_str(),
                    index + 1,
                    total,
                    pending.plan.sync.len() as u64,
                );
            }

            let result = self.install_package(pending, mode, now, progress.as_deref_mut());
            match result {
                Ok(package_outcome) => {
                    if let Some(progress) = progress.as_deref_mut() {
                        progress.finish_package();
                    }
                    outcome.packages.push(package_outcome);
                }
                Err(err) => {
                    if let Some(progress) = progress.as_deref_mut() {
                        progress.abandon();
                    }
                    return Err(err);
                }
            }
        }

        Ok(outcome)
    }

    /// Plan every package up front so a bad selection fails before any write
    fn plan(
        &self,
        action: Action,
        request: &InstallRequest,
        state: &InstallationState,
    ) -> Result<Vec<Pending>> {
        let planner = Planner::new(self.sources);
        let checker = self.checker();
        let mut pending = Vec::new();

        if action.installs_core() {
            let previous = state.core_manifest.clone();
            let (plan, repaired, ides) = match (action, &previous) {
                (Action::Repair, Some(manifest)) => {
                    let report = checker.check(manifest);
                    let ides = if request.ides.is_empty() {
                        manifest.ides_setup.clone()
                    } else {
                        request.ides.clone()
                    };
                    let plan = planner.core(&Selection::from_manifest(manifest)?)?;
                    (plan, Some(report), ides)
                }
                _ => (planner.core(&request.selection)?, None, request.ides.clone()),
            };
            pending.push(Pending {
                plan,
                previous,
                ides,
                repaired,
            });
        }

        let mut packs: Vec<String> = Vec::new();
        for id in &request.expansion_packs {
            if !packs.contains(id) {
                packs.push(id.clone());
            }
        }
        let refresh: Vec<String> = match action {
            Action::Repair => {
                let available: BTreeSet<String> =
                    self.sources.expansion_ids().into_iter().collect();
                state
                    .expansion_packages
                    .iter()
                    .filter(|(id, pack)| pack.has_manifest && available.contains(*id))
                    .map(|(id, _)| id.clone())
                    .collect()
            }
            Action::ExpansionOnly => self.survey(state, request).findings.packs_to_refresh(),
            Action::Upgrade => self.survey(state, request).findings.outdated_packs,
            _ => Vec::new(),
        };
        for id in refresh {
            if !packs.contains(&id) {
                packs.push(id);
            }
        }

        for id in packs {
            let plan = planner.expansion(&id)?;
            let previous = ManifestStore::read(self.root, plan.package());
            let repaired = (action == Action::Repair)
                .then(|| previous.as_ref().map(|m| checker.check(m)))
                .flatten();
            let ides = match &previous {
                Some(manifest) if request.ides.is_empty() => manifest.ides_setup.clone(),
                _ => request.ides.clone(),
            };
            pending.push(Pending {
                plan,
                previous,
                ides,
                repaired,
            });
        }

        Ok(pending)
    }

    fn install_package(
        &self,
        pending: Pending,
        mode: SyncMode,
        now: DateTime<Utc>,
        progress: Option<&mut (dyn ProgressReporter + '_)>,
    ) -> Result<PackageOutcome> {
        let Pending {
            plan,
            previous,
            ides,
            repaired,
        } = pending;
        let package = plan.package().clone();

        if let Some(report) = &repaired {
            info!(
                package = %package,
                missing = report.missing.len(),
                modified = report.modified.len(),
                "Repairing package"
            );
        }

        let report = FileSyncEngine::new(self.root)
            .mode(mode)
            .previous(previous.as_ref())
            .timestamp(now)
            .sync(&plan.sync, progress)?;

        for orphan in &report.orphaned {
            warn!(package = %package, path = %orphan, "File no longer provided by the package; left in place");
        }

        let mut manifest = plan.manifest();
        manifest.ides_setup = ides;
        manifest.files = report.manifest_files();
        ManifestStore::write(self.root, &package, &manifest)?;

        info!(
            package = %package,
            version = %manifest.version,
            files = manifest.files.len(),
            "Wrote install manifest"
        );

        Ok(PackageOutcome {
            package: package.to_string(),
            version: manifest.version,
            install_type: manifest.install_type,
            repaired,
            sync: report,
            unresolved: plan.unresolved,
        })
    }

    /// Rename the legacy directory to `agentkit-agent.bak-<timestamp>`
    fn move_legacy_aside(&self, now: DateTime<Utc>) -> Result<String> {
        let legacy = self.root.path().join(LEGACY_DIR);
        let stamp = now.format("%Y%m%dT%H%M%SZ");

        let mut name = format!("{LEGACY_DIR}.bak-{stamp}");
        let mut counter = 1;
        while self.root.path().join(&name).exists() {
            name = format!("{LEGACY_DIR}.bak-{stamp}-{counter}");
            counter += 1;
        }

        std::fs::rename(&legacy, self.root.path().join(&name))
            .map_err(|e| path_error(legacy.display().to_string(), e.to_string()))?;
        info!(from = LEGACY_DIR, to = %name, "Moved legacy installation aside");
        Ok(name)
    }
}

/// Whether a state needs the caller to pick an escape before installing
pub fn needs_explicit_choice(state: &InstallationState) -> bool {
    matches!(
        state.kind,
        StateKind::LegacyStructurePresent | StateKind::UnrecognizedExisting
    )
}
