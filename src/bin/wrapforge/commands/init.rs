//! `wrapforge init` command

use anyhow::Result;

use crate::cli::InitArgs;
use wrapforge::ops::{init_project, InitOptions};

pub fn execute(args: InitArgs) -> Result<()> {
    let dir = match args.path {
        Some(p) => p,
        None => std::env::current_dir()?,
    };

    let opts = InitOptions {
        name: args.name,
        force: args.force,
    };

    let manifest_path = init_project(&dir, &opts)?;
    eprintln!("{:>12} {}", "Created", manifest_path.display());
    Ok(())
}
