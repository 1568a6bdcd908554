//! Command implementations for the agentkit CLI

pub mod completions;
pub mod install;
pub mod status;
pub mod version;

use std::path::{Path, PathBuf};

use agentkit::collection::SourceTree;
use agentkit::error::{Result, path_error};
use agentkit::root::InstallationRoot;

use crate::cli::install::TargetArgs;

/// Resolve the source tree and installation root from command-line arguments
pub fn open_target(target: &TargetArgs) -> Result<(InstallationRoot, SourceTree)> {
    let cwd = std::env::current_dir()
        .map_err(|e| path_error(".", format!("cannot read current directory: {e}")))?;

    let source = absolute(&cwd, &target.source);
    let source = dunce::canonicalize(&source).unwrap_or(source);
    let sources = SourceTree::open(source)?;

    let dir = target
        .dir
        .as_deref()
        .map_or_else(|| cwd.clone(), |dir| absolute(&cwd, dir));
    let dir = dunce::canonicalize(&dir).unwrap_or(dir);

    Ok((InstallationRoot::new(dir), sources))
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
