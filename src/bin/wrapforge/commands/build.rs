//! `wrapforge build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::GlobalOptions;
use wrapforge::ops::{build, BuildOptions};

pub fn execute(args: BuildArgs, global: &GlobalOptions) -> Result<()> {
    let ws = super::workspace(global)?;

    let opts = BuildOptions {
        targets: args.targets,
        dry_run: args.dry_run,
        verbose: global.verbose,
        message_format: global.message_format,
    };

    build(&ws, &opts)?;
    Ok(())
}
