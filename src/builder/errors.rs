//! Pipeline error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A fatal error raised while running the build pipeline.
///
/// There are exactly two kinds: a prerequisite that nothing can produce is
/// absent, or an external tool failed. Both halt the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing input `{}` required by `{target}`", path.display())]
    MissingInput { path: PathBuf, target: String },

    #[error("`{command}` failed with {}", describe_code(*code))]
    ToolFailure {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl PipelineError {
    /// Process exit status the CLI should report for this error.
    ///
    /// Tool failures surface the tool's own status; a tool killed by a
    /// signal and a missing input both map to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MissingInput { .. } => 1,
            PipelineError::ToolFailure { code, .. } => match code {
                Some(0) | None => 1,
                Some(c) => *c,
            },
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PipelineError::MissingInput { path, target } => {
                Diagnostic::error(format!("missing input `{}`", path.display()))
                    .with_location(path)
                    .with_context(format!("required by `{}`", target))
                    .with_context("no rule produces this file")
                    .with_suggestion(format!("Create `{}` or fix the path in Wrapforge.toml", path.display()))
            }
            PipelineError::ToolFailure {
                command,
                code,
                stderr,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "tool failed with {}",
                    describe_code(*code)
                ))
                .with_context(format!("command: {}", command));

                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }

                diag.with_suggestion(suggestions::BUILD_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_exit_code_is_passed_through() {
        let err = PipelineError::ToolFailure {
            command: "g++ -c a.cpp".to_string(),
            code: Some(4),
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("exit code 4"));
    }

    #[test]
    fn test_signal_termination_maps_to_one() {
        let err = PipelineError::ToolFailure {
            command: "swig".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_input_diagnostic() {
        let err = PipelineError::MissingInput {
            path: PathBuf::from("SerialInterface.i"),
            target: "SerialInterface_wrap.cxx".to_string(),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("missing input `SerialInterface.i`"));
        assert!(output.contains("--> SerialInterface.i"));
        assert!(output.contains("required by `SerialInterface_wrap.cxx`"));
        assert_eq!(err.exit_code(), 1);
    }
}
