//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod init;
pub mod logconf;
pub mod plan;
pub mod smart;
pub mod tidy;

use anyhow::Result;

use wrapforge::core::Workspace;

use crate::GlobalOptions;

/// Locate and load the workspace named by the global flags.
pub(crate) fn workspace(global: &GlobalOptions) -> Result<Workspace> {
    let cwd = std::env::current_dir()?;
    Workspace::discover(&cwd, global.manifest_path.as_deref())
}
