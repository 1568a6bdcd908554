//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - status: Status command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod completions;
pub mod install;
pub mod status;

pub use completions::CompletionsArgs;
pub use install::{ActionArg, InstallArgs};
pub use status::StatusArgs;

/// agentkit - install and reconcile agent resource packages
#[derive(Parser, Debug)]
#[command(
    name = "agentkit",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install agent resource packages into a project and keep them in sync",
    long_about = "agentkit copies agents, teams and their dependencies from a source tree into a \
                  project directory, records what it wrote, and later upgrades, repairs or \
                  reinstalls them without losing local edits.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  agentkit status --source ./dist                 \x1b[90m# What is installed here?\x1b[0m\n   \
                  agentkit install --source ./dist                \x1b[90m# Recommended action\x1b[0m\n   \
                  agentkit install --source ./dist --agent dev    \x1b[90m# One agent and its dependencies\x1b[0m\n   \
                  agentkit install --source ./dist --pack infra   \x1b[90m# Add an expansion package\x1b[0m\n   \
                  agentkit install --source ./dist --action repair\n\n\
                  "
)]
pub struct Cli {
    /// Enable verbose logging (same as RUST_LOG=agentkit=debug)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install, upgrade or repair packages in a project
    Install(InstallArgs),

    /// Show what is installed and which actions are available
    Status(StatusArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
