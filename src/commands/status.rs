//! Status command

use console::Style;

use agentkit::error::Result;
use agentkit::integrity::IntegrityReport;
use agentkit::reconcile::{Assessment, InstallRequest, Reconciler};

use crate::cli::StatusArgs;

/// Run status command
pub fn run(args: StatusArgs) -> Result<()> {
    let (root, sources) = super::open_target(&args.target)?;
    let request = InstallRequest {
        expansion_packs: args.packs,
        ..InstallRequest::default()
    };
    let assessment = Reconciler::new(&root, &sources).assess(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        display(&assessment);
    }
    Ok(())
}

fn display(assessment: &Assessment) {
    let bold = Style::new().bold();
    let cyan = Style::new().cyan();

    println!("{} {}", bold.apply_to("Root:"), assessment.root);
    println!("{} {}", bold.apply_to("State:"), assessment.state.kind);
    if assessment.state.has_other_files {
        println!("       (directory already contains other files)");
    }
    println!(
        "{} installed {}, available {}",
        bold.apply_to("Core:"),
        assessment
            .installed_version
            .map_or_else(|| "-".to_string(), |v| v.to_string()),
        assessment.available_version
    );
    if let Some(report) = &assessment.core_integrity {
        display_report("  ", report);
    }

    if !assessment.state.expansion_packages.is_empty() {
        println!("{}", bold.apply_to("Expansion packages:"));
        for (id, pack) in &assessment.state.expansion_packages {
            let version = pack
                .installed_version
                .map_or_else(|| "no manifest".to_string(), |v| v.to_string());
            match assessment.expansion_updates.get(id) {
                Some(newer) => println!(
                    "  {} {} ({} {newer})",
                    cyan.apply_to(id),
                    version,
                    Style::new().yellow().apply_to("update available:")
                ),
                None => println!("  {} {}", cyan.apply_to(id), version),
            }
            if let Some(report) = assessment.expansion_integrity.get(id) {
                display_report("    ", report);
            }
        }
    }

    let actions: Vec<&str> = assessment
        .available_actions
        .iter()
        .map(|a| a.as_str())
        .collect();
    println!("{} {}", bold.apply_to("Actions:"), actions.join(", "));
    println!(
        "{} {}",
        bold.apply_to("Recommended:"),
        Style::new().green().bold().apply_to(assessment.recommended)
    );
}

fn display_report(indent: &str, report: &IntegrityReport) {
    let red = Style::new().red();
    let yellow = Style::new().yellow();

    if report.is_clean() && report.unverifiable.is_empty() {
        println!("{indent}{}", Style::new().green().apply_to("all files intact"));
        return;
    }
    for path in &report.missing {
        println!("{indent}{} {path}", red.apply_to("missing"));
    }
    for path in &report.modified {
        println!("{indent}{} {path}", yellow.apply_to("modified"));
    }
    for path in &report.unverifiable {
        println!("{indent}{} {path}", Style::new().dim().apply_to("unverifiable"));
    }
}
