use clap::Parser;

use super::install::TargetArgs;

/// Arguments for status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Expansion packages the recommendation should account for
    #[arg(long = "pack", short = 'p', value_name = "ID")]
    pub packs: Vec<String>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}
