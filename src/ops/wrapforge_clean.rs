//! Implementation of `wrapforge clean` and `wrapforge tidy`.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::events::{report, BuildEvent, MessageFormat};
use crate::builder::plan::ArtifactClass;
use crate::builder::BuildPlan;
use crate::core::Workspace;
use crate::util::fs::remove_file_if_exists;

/// Which generated files to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanScope {
    /// Intermediates only (objects, generated wrapper source)
    Tidy,
    /// Final targets only (shared module, Python stub)
    Clean,
}

impl CleanScope {
    fn includes(&self, class: ArtifactClass) -> bool {
        match self {
            CleanScope::Tidy => class == ArtifactClass::Intermediate,
            CleanScope::Clean => class == ArtifactClass::Final,
        }
    }
}

/// Remove generated files in `scope`; returns the files that were present.
///
/// Files already absent are skipped silently, so running twice is a no-op.
/// Source files are never touched: only paths some step produces are
/// candidates.
pub fn clean(ws: &Workspace, scope: CleanScope, format: MessageFormat) -> Result<Vec<PathBuf>> {
    let plan = BuildPlan::from_workspace(ws)?;

    let mut removed = Vec::new();
    for artifact in plan.steps.iter().flat_map(|s| s.outputs.iter()) {
        if !scope.includes(artifact.class) {
            continue;
        }
        if remove_file_if_exists(&ws.path(&artifact.path))? {
            let shown = artifact.path.display().to_string();
            report(
                format,
                &BuildEvent::ArtifactRemoved {
                    path: artifact.path.clone(),
                },
                Some(("Removed", &shown)),
            );
            removed.push(artifact.path.clone());
        } else {
            tracing::debug!("already absent: {}", artifact.path.display());
        }
    }

    Ok(removed)
}
