//! Implementation of `wrapforge build` (goal `all`) and `wrapforge smart`.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::events::MessageFormat;
use crate::builder::{BuildExecutor, BuildPlan, BuildReport};
use crate::core::Workspace;
use crate::ops::wrapforge_clean::{clean, CleanScope};

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Specific outputs to bring up to date (empty = the `all` goal)
    pub targets: Vec<String>,

    /// Print commands without running them
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Human status lines or JSON events
    pub message_format: MessageFormat,
}

/// Build the requested targets.
pub fn build(ws: &Workspace, opts: &BuildOptions) -> Result<BuildReport> {
    let plan = BuildPlan::from_workspace(ws)?;
    let goals = resolve_goals(&plan, &opts.targets)?;

    tracing::debug!(
        "building {} goal(s) from {}",
        goals.len(),
        ws.manifest_path().display()
    );

    BuildExecutor::new(ws, &plan)
        .verbose(opts.verbose)
        .dry_run(opts.dry_run)
        .message_format(opts.message_format)
        .execute(&goals)
}

/// Build everything, then remove the intermediates (`all` followed by `tidy`).
///
/// Intermediates are only removed after a successful build; a dry run
/// removes nothing.
pub fn smart(ws: &Workspace, opts: &BuildOptions) -> Result<(BuildReport, Vec<PathBuf>)> {
    let opts = BuildOptions {
        targets: Vec::new(),
        ..opts.clone()
    };
    let report = build(ws, &opts)?;

    if opts.dry_run {
        return Ok((report, Vec::new()));
    }

    let removed = clean(ws, CleanScope::Tidy, opts.message_format)?;
    Ok((report, removed))
}

fn resolve_goals(plan: &BuildPlan, targets: &[String]) -> Result<Vec<PathBuf>> {
    if targets.is_empty() || targets.iter().all(|t| t == "all") {
        return Ok(plan.default_goals());
    }

    let mut goals = Vec::new();
    for target in targets {
        if target == "all" {
            goals.extend(plan.default_goals());
        } else {
            goals.push(plan.resolve_target(target)?);
        }
    }
    goals.dedup();
    Ok(goals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::{default_manifest, Manifest};

    fn plan() -> BuildPlan {
        let manifest = Manifest::parse(&default_manifest("SerialInterface")).unwrap();
        BuildPlan::from_workspace(&Workspace::from_manifest("/p", manifest)).unwrap()
    }

    #[test]
    fn test_resolve_goals_defaults_to_all() {
        let plan = plan();
        assert_eq!(resolve_goals(&plan, &[]).unwrap(), plan.default_goals());
        assert_eq!(
            resolve_goals(&plan, &["all".to_string()]).unwrap(),
            plan.default_goals()
        );
    }

    #[test]
    fn test_resolve_goals_named_targets() {
        let goals = resolve_goals(
            &plan(),
            &["SerialInterface.o".to_string(), "SerialInterface.py".to_string()],
        )
        .unwrap();
        assert_eq!(
            goals,
            vec![
                PathBuf::from("SerialInterface.o"),
                PathBuf::from("SerialInterface.py")
            ]
        );
    }

    #[test]
    fn test_resolve_goals_unknown_target() {
        assert!(resolve_goals(&plan(), &["bogus".to_string()]).is_err());
    }
}
