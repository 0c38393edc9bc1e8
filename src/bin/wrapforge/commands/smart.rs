//! `wrapforge smart` command

use anyhow::Result;

use crate::cli::SmartArgs;
use crate::GlobalOptions;
use wrapforge::ops::{smart, BuildOptions};

pub fn execute(args: SmartArgs, global: &GlobalOptions) -> Result<()> {
    let ws = super::workspace(global)?;

    let opts = BuildOptions {
        targets: Vec::new(),
        dry_run: args.dry_run,
        verbose: global.verbose,
        message_format: global.message_format,
    };

    let (_, removed) = smart(&ws, &opts)?;
    tracing::debug!("tidied {} intermediate(s)", removed.len());
    Ok(())
}
