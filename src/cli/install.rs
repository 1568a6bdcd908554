use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use agentkit::reconcile::Action;

/// Source tree and installation root shared by every command
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Source tree containing core/, common/ and expansion-packs/
    #[arg(long, short = 's', env = "AGENTKIT_SOURCE")]
    pub source: PathBuf,

    /// Installation root (defaults to current directory)
    #[arg(long, short = 'd', env = "AGENTKIT_DIR")]
    pub dir: Option<PathBuf>,
}

/// Actions selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
    FreshInstall,
    Upgrade,
    Reinstall,
    Repair,
    ExpansionOnly,
    Migrate,
    InstallAlongside,
    Force,
    Relocate,
    Cancel,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::FreshInstall => Action::FreshInstall,
            ActionArg::Upgrade => Action::Upgrade,
            ActionArg::Reinstall => Action::Reinstall,
            ActionArg::Repair => Action::Repair,
            ActionArg::ExpansionOnly => Action::ExpansionOnly,
            ActionArg::Migrate => Action::Migrate,
            ActionArg::InstallAlongside => Action::InstallAlongside,
            ActionArg::Force => Action::Force,
            ActionArg::Relocate => Action::Relocate,
            ActionArg::Cancel => Action::Cancel,
        }
    }
}

/// Arguments for install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Install or upgrade everything in the current directory:\n    agentkit install --source ./dist\n\n\
                  Install one team into another directory:\n    agentkit install --source ./dist --dir ../app --team team-dev\n\n\
                  Add expansion packages without touching the core install:\n    agentkit install --source ./dist --pack infra --action expansion-only\n\n\
                  Move a legacy install aside and install fresh:\n    agentkit install --source ./dist --action migrate")]
pub struct InstallArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Install a single agent and its dependencies instead of everything
    #[arg(long, conflicts_with = "team")]
    pub agent: Option<String>,

    /// Install a team, its agents and their dependencies
    #[arg(long)]
    pub team: Option<String>,

    /// Expansion package to install (can be repeated)
    #[arg(long = "pack", short = 'p', value_name = "ID")]
    pub packs: Vec<String>,

    /// IDE integration to record in the manifest (can be repeated)
    #[arg(long = "ide", value_name = "NAME")]
    pub ides: Vec<String>,

    /// Action to take (defaults to the recommended one)
    #[arg(long, short = 'a', value_enum)]
    pub action: Option<ActionArg>,

    /// Leave files that already exist untouched
    #[arg(long)]
    pub skip_existing: bool,
}
