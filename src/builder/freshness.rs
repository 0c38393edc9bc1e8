//! Timestamp-based staleness checks for incremental builds.
//!
//! A step is fresh when all of its outputs exist and none of its
//! prerequisites was modified after the oldest output. Equal timestamps
//! count as fresh.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;

use crate::builder::plan::BuildStep;
use crate::util::fs::mtime;

/// Why a step has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// An output does not exist yet
    MissingOutput(PathBuf),
    /// A prerequisite is newer than the oldest output
    NewerInput { input: PathBuf, output: PathBuf },
    /// A step producing one of the prerequisites runs in this invocation
    UpstreamRebuilt(PathBuf),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::MissingOutput(p) => write!(f, "`{}` does not exist", p.display()),
            StaleReason::NewerInput { input, output } => write!(
                f,
                "`{}` is newer than `{}`",
                input.display(),
                output.display()
            ),
            StaleReason::UpstreamRebuilt(p) => write!(f, "`{}` is being rebuilt", p.display()),
        }
    }
}

/// Result of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale(StaleReason),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Compare a step's outputs against its inputs on disk.
///
/// Inputs that do not exist are skipped here; the executor reports them as
/// missing before asking about freshness.
pub fn check(root: &Path, step: &BuildStep) -> Result<Freshness> {
    let mut oldest: Option<(SystemTime, &Path)> = None;
    for output in step.output_paths() {
        match mtime(&root.join(output))? {
            None => return Ok(Freshness::Stale(StaleReason::MissingOutput(output.to_path_buf()))),
            Some(t) => {
                if oldest.map(|(o, _)| t < o).unwrap_or(true) {
                    oldest = Some((t, output));
                }
            }
        }
    }

    let Some((oldest_time, oldest_output)) = oldest else {
        // A step without outputs can never be up to date.
        return Ok(Freshness::Stale(StaleReason::MissingOutput(PathBuf::new())));
    };

    for input in &step.inputs {
        if let Some(t) = mtime(&root.join(input))? {
            if t > oldest_time {
                return Ok(Freshness::Stale(StaleReason::NewerInput {
                    input: input.clone(),
                    output: oldest_output.to_path_buf(),
                }));
            }
        }
    }

    Ok(Freshness::Fresh)
}
