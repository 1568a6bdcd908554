//! Install command
//!
//! Maps flags to an action and an install request; all decisions are made by
//! the reconciler.

use console::{Style, Term};

use agentkit::error::Result;
use agentkit::installer::{FileStatus, SyncMode};
use agentkit::reconcile::{
    Action, InstallRequest, Outcome, Reconciler, Selection, needs_explicit_choice,
};
use agentkit::ui::{InteractiveProgressReporter, ProgressReporter, SilentProgressReporter};

use crate::cli::InstallArgs;

/// Run install command
pub fn run(args: InstallArgs) -> Result<()> {
    let (root, sources) = super::open_target(&args.target)?;
    let request = request_from(&args);
    let reconciler = Reconciler::new(&root, &sources);

    let action = match args.action {
        Some(action) => Action::from(action),
        None => {
            let assessment = reconciler.assess(&request)?;
            if needs_explicit_choice(&assessment.state) {
                let choices: Vec<&str> = assessment
                    .available_actions
                    .iter()
                    .map(|a| a.as_str())
                    .collect();
                println!(
                    "{} {} is {}; choose one with --action: {}",
                    Style::new().yellow().bold().apply_to("!"),
                    root.path().display(),
                    assessment.state.kind,
                    choices.join(", ")
                );
                return Ok(());
            }
            assessment.recommended
        }
    };

    let packages = usize::from(action.installs_core()) + request.expansion_packs.len();
    let mut progress: Box<dyn ProgressReporter> = if Term::stderr().is_term() {
        Box::new(InteractiveProgressReporter::new(packages as u64))
    } else {
        Box::new(SilentProgressReporter)
    };

    let outcome = reconciler.execute(action, &request, Some(progress.as_mut()))?;
    display_outcome(&outcome);
    Ok(())
}

fn request_from(args: &InstallArgs) -> InstallRequest {
    let selection = match (&args.agent, &args.team) {
        (Some(agent), _) => Selection::Agent(agent.clone()),
        (None, Some(team)) => Selection::Team(team.clone()),
        (None, None) => Selection::Full,
    };
    InstallRequest {
        selection,
        expansion_packs: args.packs.clone(),
        ides: args.ides.iter().cloned().collect(),
        mode: if args.skip_existing {
            SyncMode::SkipExisting
        } else {
            SyncMode::Overwrite
        },
    }
}

fn display_outcome(outcome: &Outcome) {
    let bold = Style::new().bold();
    let green = Style::new().green().bold();
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();

    if outcome.packages.is_empty() {
        println!("{} ({})", bold.apply_to("Nothing to do"), outcome.action);
        return;
    }

    if let Some(moved) = &outcome.legacy_backup {
        println!("Moved legacy installation to {}", bold.apply_to(moved));
    }

    for package in &outcome.packages {
        let sync = &package.sync;
        println!(
            "{} {} {} ({}): {} created, {} updated, {} unchanged{}",
            green.apply_to("✓"),
            bold.apply_to(&package.package),
            package.version,
            package.install_type,
            sync.count(FileStatus::Created),
            sync.count(FileStatus::Updated),
            sync.count(FileStatus::Unchanged),
            match sync.count(FileStatus::Skipped) {
                0 => String::new(),
                n => format!(", {n} skipped"),
            }
        );

        for backup in &sync.backups {
            println!("    {} {}", dim.apply_to("backup"), backup);
        }
        for orphan in &sync.orphaned {
            println!(
                "    {} {} {}",
                yellow.apply_to("orphaned"),
                orphan,
                dim.apply_to("(no longer provided, left in place)")
            );
        }
        for unresolved in &package.unresolved {
            println!("    {} {}", yellow.apply_to("unresolved"), unresolved);
        }
    }
}
