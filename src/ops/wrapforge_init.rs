//! Implementation of `wrapforge init`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::manifest::{default_manifest, Manifest, MANIFEST_NAME};
use crate::util::fs::write_string;

/// Options for initializing a project.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Module name (defaults to `SerialInterface`)
    pub name: Option<String>,

    /// Overwrite an existing manifest
    pub force: bool,
}

/// Write a default Wrapforge.toml into `dir`.
pub fn init_project(dir: &Path, opts: &InitOptions) -> Result<PathBuf> {
    let manifest_path = dir.join(MANIFEST_NAME);
    if manifest_path.exists() && !opts.force {
        bail!(
            "`{}` already exists in `{}`\n\
             \n\
             Use `wrapforge init --force` to overwrite it.",
            MANIFEST_NAME,
            dir.display()
        );
    }

    let name = opts.name.as_deref().unwrap_or("SerialInterface");
    let contents = default_manifest(name);
    // Reject names that would produce an invalid manifest before writing.
    Manifest::parse(&contents)?;

    write_string(&manifest_path, &contents)?;
    Ok(manifest_path)
}
