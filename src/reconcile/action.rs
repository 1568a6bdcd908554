//! Actions and the transitions allowed from each state

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::root::detection::{InstallationState, StateKind};
use crate::version::Version;

/// What the caller chose to do with a root
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    FreshInstall,
    Upgrade,
    /// Same version again, or a downgrade
    Reinstall,
    Repair,
    ExpansionOnly,
    /// Move the legacy directory aside, then install fresh
    Migrate,
    /// Install fresh and leave the legacy directory alone
    InstallAlongside,
    /// Install over an unrecognized core directory
    Force,
    /// Pick another root; nothing happens here
    Relocate,
    Cancel,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Self::FreshInstall,
        Self::Upgrade,
        Self::Reinstall,
        Self::Repair,
        Self::ExpansionOnly,
        Self::Migrate,
        Self::InstallAlongside,
        Self::Force,
        Self::Relocate,
        Self::Cancel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreshInstall => "fresh-install",
            Self::Upgrade => "upgrade",
            Self::Reinstall => "reinstall",
            Self::Repair => "repair",
            Self::ExpansionOnly => "expansion-only",
            Self::Migrate => "migrate",
            Self::InstallAlongside => "install-alongside",
            Self::Force => "force",
            Self::Relocate => "relocate",
            Self::Cancel => "cancel",
        }
    }

    /// Actions that never touch the filesystem
    pub fn is_no_op(self) -> bool {
        matches!(self, Self::Relocate | Self::Cancel)
    }

    /// Actions that (re)install the core package
    pub fn installs_core(self) -> bool {
        !matches!(self, Self::ExpansionOnly | Self::Relocate | Self::Cancel)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

/// Every action the caller may choose from a detected state
pub fn available_actions(state: &InstallationState, available: Version) -> Vec<Action> {
    match state.kind {
        StateKind::Clean => vec![Action::FreshInstall, Action::ExpansionOnly, Action::Cancel],
        StateKind::CorePresent => {
            let installed = state.installed_version().unwrap_or_default();
            let mut actions = match installed.cmp(&available) {
                Ordering::Less => vec![Action::Upgrade],
                Ordering::Equal => vec![Action::Repair, Action::Reinstall],
                Ordering::Greater => vec![Action::Reinstall],
            };
            actions.extend([Action::ExpansionOnly, Action::Cancel]);
            actions
        }
        StateKind::LegacyStructurePresent => vec![
            Action::Migrate,
            Action::InstallAlongside,
            Action::Relocate,
            Action::Cancel,
        ],
        StateKind::UnrecognizedExisting => vec![Action::Force, Action::Relocate, Action::Cancel],
    }
}

/// What an assessment found beyond the detected state
///
/// Pack lists only name expansion packages that are installed with a
/// manifest and still present in the sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    /// The core package has missing or modified files
    pub core_drifted: bool,
    /// Expansion packages with missing or modified files
    pub drifted_packs: Vec<String>,
    /// Expansion packages whose source version is newer than the installed one
    pub outdated_packs: Vec<String>,
    /// The caller named expansion packages to install
    pub wants_expansion_packs: bool,
}

impl Findings {
    /// Installed packages an expansion-only run should sync again
    pub fn packs_to_refresh(&self) -> Vec<String> {
        self.drifted_packs
            .iter()
            .chain(&self.outdated_packs)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// The action to take when the caller has not chosen one
///
/// Legacy and unrecognized roots need an explicit choice, so they recommend
/// `Cancel`. A core install that is newer than the sources only recommends
/// work on expansion packages.
pub fn recommend(state: &InstallationState, available: Version, findings: &Findings) -> Action {
    match state.kind {
        StateKind::Clean => Action::FreshInstall,
        StateKind::CorePresent => {
            let installed = state.installed_version().unwrap_or_default();
            let drifted = findings.core_drifted || !findings.drifted_packs.is_empty();
            let expansion_work = findings.wants_expansion_packs
                || !findings.drifted_packs.is_empty()
                || !findings.outdated_packs.is_empty();
            match installed.cmp(&available) {
                Ordering::Less => Action::Upgrade,
                Ordering::Equal if drifted => Action::Repair,
                _ if expansion_work => Action::ExpansionOnly,
                _ => Action::Cancel,
            }
        }
        StateKind::LegacyStructurePresent | StateKind::UnrecognizedExisting => Action::Cancel,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::manifest::{InstallType, Manifest};

    fn state(kind: StateKind, installed: Option<Version>) -> InstallationState {
        InstallationState {
            kind,
            core_manifest: installed.map(|v| Manifest::new(v, InstallType::Full)),
            has_other_files: false,
            expansion_packages: BTreeMap::new(),
        }
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.to_string().parse::<Action>(), Ok(action));
        }
        assert!("explode".parse::<Action>().is_err());
    }

    #[test]
    fn test_clean_root() {
        let clean = state(StateKind::Clean, None);
        assert_eq!(
            available_actions(&clean, v("1.0.0")),
            vec![Action::FreshInstall, Action::ExpansionOnly, Action::Cancel]
        );
        assert_eq!(recommend(&clean, v("1.0.0"), &Findings::default()), Action::FreshInstall);
    }

    #[test]
    fn test_older_install_offers_upgrade() {
        let installed = state(StateKind::CorePresent, Some(v("1.2.0")));
        let actions = available_actions(&installed, v("1.3.0"));
        assert!(actions.contains(&Action::Upgrade));
        assert!(!actions.contains(&Action::Repair));
        assert_eq!(recommend(&installed, v("1.3.0"), &Findings::default()), Action::Upgrade);
    }

    #[test]
    fn test_same_version_recommends_repair_only_with_issues() {
        let installed = state(StateKind::CorePresent, Some(v("1.3.0")));
        let actions = available_actions(&installed, v("1.3"));
        assert!(actions.contains(&Action::Repair));
        assert!(actions.contains(&Action::Reinstall));
        assert!(!actions.contains(&Action::Upgrade));

        let nothing = Findings::default();
        assert_eq!(recommend(&installed, v("1.3.0"), &nothing), Action::Cancel);

        let wants_packs = Findings {
            wants_expansion_packs: true,
            ..Findings::default()
        };
        assert_eq!(
            recommend(&installed, v("1.3.0"), &wants_packs),
            Action::ExpansionOnly
        );

        let broken = Findings {
            core_drifted: true,
            ..Findings::default()
        };
        assert_eq!(recommend(&installed, v("1.3.0"), &broken), Action::Repair);
    }

    #[test]
    fn test_drifted_pack_recommends_repair() {
        let installed = state(StateKind::CorePresent, Some(v("1.3.0")));
        let findings = Findings {
            drifted_packs: vec!["infra".to_string()],
            ..Findings::default()
        };
        assert_eq!(recommend(&installed, v("1.3.0"), &findings), Action::Repair);

        // Repair is not offered over a newer core, so the pack is synced alone
        let newer = state(StateKind::CorePresent, Some(v("2.0.0")));
        assert_eq!(
            recommend(&newer, v("1.3.0"), &findings),
            Action::ExpansionOnly
        );
    }

    #[test]
    fn test_outdated_pack_recommends_expansion_only() {
        let installed = state(StateKind::CorePresent, Some(v("1.3.0")));
        let findings = Findings {
            outdated_packs: vec!["infra".to_string()],
            ..Findings::default()
        };
        assert_eq!(
            recommend(&installed, v("1.3.0"), &findings),
            Action::ExpansionOnly
        );
        assert_eq!(recommend(&installed, v("1.4.0"), &findings), Action::Upgrade);
    }

    #[test]
    fn test_packs_to_refresh_is_sorted_and_deduplicated() {
        let findings = Findings {
            drifted_packs: vec!["infra".to_string(), "game-dev".to_string()],
            outdated_packs: vec!["infra".to_string()],
            ..Findings::default()
        };
        assert_eq!(findings.packs_to_refresh(), vec!["game-dev", "infra"]);
    }

    #[test]
    fn test_newer_install_only_offers_reinstall() {
        let installed = state(StateKind::CorePresent, Some(v("2.0.0")));
        assert_eq!(
            available_actions(&installed, v("1.3.0")),
            vec![Action::Reinstall, Action::ExpansionOnly, Action::Cancel]
        );
        assert_eq!(recommend(&installed, v("1.3.0"), &Findings::default()), Action::Cancel);
    }

    #[test]
    fn test_legacy_and_unrecognized_need_explicit_choice() {
        let legacy = state(StateKind::LegacyStructurePresent, None);
        assert_eq!(
            available_actions(&legacy, v("1.0.0")),
            vec![
                Action::Migrate,
                Action::InstallAlongside,
                Action::Relocate,
                Action::Cancel
            ]
        );
        assert_eq!(recommend(&legacy, v("1.0.0"), &Findings::default()), Action::Cancel);

        let unknown = state(StateKind::UnrecognizedExisting, None);
        assert_eq!(
            available_actions(&unknown, v("1.0.0")),
            vec![Action::Force, Action::Relocate, Action::Cancel]
        );
    }

    #[test]
    fn test_action_classes() {
        assert!(Action::Cancel.is_no_op());
        assert!(Action::Relocate.is_no_op());
        assert!(!Action::Repair.is_no_op());
        assert!(Action::Migrate.installs_core());
        assert!(!Action::ExpansionOnly.installs_core());
    }
}
