//! Build event types for JSON output.
//!
//! With `--message-format json` every event is written to stdout as one
//! JSON object per line, tagged by `reason`:
//!
//! - `build-started`: the steps considered for the requested goals
//! - `step-fresh`: a step was up to date and skipped
//! - `step-finished`: a step ran (or would run, in a dry run)
//! - `artifact-removed`: `clean`/`tidy` deleted a file
//! - `build-finished`: the invocation completed (success or failure)
//!
//! New fields may be added; existing fields are not renamed or removed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::plan::StepKind;

/// A build event emitted during the build process.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    #[serde(rename = "build-started")]
    BuildStarted {
        /// Requested goal files
        goals: Vec<PathBuf>,
        /// Number of steps considered
        steps: u64,
        /// Whether commands are only printed
        dry_run: bool,
    },

    #[serde(rename = "step-fresh")]
    StepFresh {
        kind: StepKind,
        outputs: Vec<PathBuf>,
    },

    #[serde(rename = "step-finished")]
    StepFinished {
        kind: StepKind,
        outputs: Vec<PathBuf>,
        /// Command line that was (or would be) executed
        command: String,
        /// Why the step had to run
        cause: String,
        /// Wall time of the tool invocation in milliseconds
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },

    #[serde(rename = "artifact-removed")]
    ArtifactRemoved { path: PathBuf },

    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        /// Number of steps that ran
        steps_run: u64,
        /// Exit status of a failed tool, if that is what stopped the build
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
}

impl BuildEvent {
    /// Create a build finished event.
    pub fn finished(success: bool, duration_ms: u64, steps_run: u64) -> Self {
        BuildEvent::BuildFinished {
            success,
            duration_ms,
            steps_run,
            exit_code: None,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// How progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    /// Status lines on stderr
    #[default]
    Human,
    /// One JSON event per line on stdout
    Json,
}

impl std::str::FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(MessageFormat::Human),
            "json" => Ok(MessageFormat::Json),
            _ => Err(format!(
                "invalid message format '{}'; expected 'human' or 'json'",
                s
            )),
        }
    }
}

/// Emit an event in JSON mode, or a right-aligned status line in human mode.
pub fn report(format: MessageFormat, event: &BuildEvent, status: Option<(&str, &str)>) {
    match format {
        MessageFormat::Json => println!("{}", event.to_json()),
        MessageFormat::Human => {
            if let Some((verb, message)) = status {
                eprintln!("{:>12} {}", verb, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_finished_serialization() {
        let event = BuildEvent::StepFinished {
            kind: StepKind::Compile,
            outputs: vec![PathBuf::from("SerialInterface.o")],
            command: "g++ -c -fPIC SerialInterface.cpp -o SerialInterface.o".to_string(),
            cause: "`SerialInterface.o` does not exist".to_string(),
            duration_ms: Some(12),
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"step-finished\""));
        assert!(json.contains("\"kind\":\"compile\""));
        assert!(json.contains("\"duration_ms\":12"));
    }

    #[test]
    fn test_finished_omits_exit_code_on_success() {
        let json = BuildEvent::finished(true, 2340, 5).to_json();
        assert!(json.contains("\"reason\":\"build-finished\""));
        assert!(json.contains("\"steps_run\":5"));
        assert!(!json.contains("exit_code"));
    }

    #[test]
    fn test_message_format_parse() {
        assert_eq!("JSON".parse::<MessageFormat>().unwrap(), MessageFormat::Json);
        assert!("xml".parse::<MessageFormat>().is_err());
    }
}
