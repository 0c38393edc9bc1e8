//! `wrapforge plan` command
//!
//! Prints every step with its inputs, outputs and command line.

use anyhow::Result;

use crate::GlobalOptions;
use wrapforge::builder::BuildPlan;

pub fn execute(global: &GlobalOptions) -> Result<()> {
    let ws = super::workspace(global)?;
    let plan = BuildPlan::from_workspace(&ws)?;
    println!("{}", plan.to_json()?);
    Ok(())
}
