//! agentkit - drift-safe installer for agent resource packages
//!
//! Installs agents, teams and their dependency files from a source tree into
//! an installation root, records what was written in a per-package manifest,
//! and reconciles later runs against that record: upgrades, repairs,
//! reinstalls and legacy migrations, with a backup of every local edit it
//! would otherwise overwrite.
//!
//! The pieces, bottom up:
//! - [`version`]: numeric version comparison
//! - [`manifest`]: the per-package install record
//! - [`root::detection`]: what is currently installed at a root
//! - [`integrity`]: recorded files vs. files on disk
//! - [`resolver`]: transitive dependency closure with search-order fallback
//! - [`installer`]: rendering, backups and atomic writes
//! - [`reconcile`]: state detection and action dispatch

pub mod collection;
pub mod error;
pub mod hash;
pub mod installer;
pub mod integrity;
pub mod manifest;
pub mod path_utils;
pub mod reconcile;
pub mod resolver;
pub mod resource;
pub mod root;
pub mod temp;
pub mod ui;
pub mod version;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{AgentkitError, Result};
