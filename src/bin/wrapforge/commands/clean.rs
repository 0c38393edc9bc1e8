//! `wrapforge clean` command

use anyhow::Result;

use crate::GlobalOptions;
use wrapforge::builder::events::MessageFormat;
use wrapforge::ops::{clean, CleanScope};

pub fn execute(global: &GlobalOptions) -> Result<()> {
    let ws = super::workspace(global)?;
    let removed = clean(&ws, CleanScope::Clean, global.message_format)?;

    if removed.is_empty() && global.message_format == MessageFormat::Human {
        eprintln!("{:>12} nothing to remove", "Clean");
    }
    Ok(())
}
