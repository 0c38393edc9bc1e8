//! `wrapforge logconf` command

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::{LogconfArgs, LogconfCommands};
use crate::GlobalOptions;
use wrapforge::core::find_manifest;
use wrapforge::logconf::LOGGING_CONFIG_NAME;
use wrapforge::ops::wrapforge_logconf::{check, init, show};
use wrapforge::util::fs::relative_path;

pub fn execute(args: LogconfArgs, global: &GlobalOptions) -> Result<()> {
    match args.command {
        LogconfCommands::Check(a) => {
            let path = locate(a.path, global)?;
            let summary = check(&path)?;
            let shown = relative_path(&std::env::current_dir()?, &path);
            eprintln!("{:>12} {} ({})", "Valid", shown.display(), summary);
        }
        LogconfCommands::Show(a) => {
            let path = locate(a.path, global)?;
            println!("{}", show(&path)?);
        }
        LogconfCommands::Init(a) => {
            let path = match a.path {
                Some(p) => p,
                None => beside_manifest(global)?,
            };
            let written = init(&path, a.force)?;
            eprintln!("{:>12} {}", "Created", written.display());
        }
    }
    Ok(())
}

/// An explicit path wins; otherwise look beside the manifest, then in the
/// current directory.
fn locate(explicit: Option<PathBuf>, global: &GlobalOptions) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p);
    }

    let candidate = beside_manifest(global)?;
    if candidate.exists() {
        return Ok(candidate);
    }
    Ok(std::env::current_dir()?.join(LOGGING_CONFIG_NAME))
}

/// `logging.toml` in the manifest's directory, or in the current directory
/// when there is no manifest.
fn beside_manifest(global: &GlobalOptions) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let manifest = match &global.manifest_path {
        Some(p) => Some(cwd.join(p)),
        None => find_manifest(&cwd).ok(),
    };

    let dir = manifest
        .as_deref()
        .and_then(Path::parent)
        .map_or(cwd, Path::to_path_buf);
    Ok(dir.join(LOGGING_CONFIG_NAME))
}
