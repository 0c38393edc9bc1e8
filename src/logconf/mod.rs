//! Declarative logging configuration.
//!
//! The document names loggers, the handlers they write to, and the
//! formatters those handlers use. It is loaded once and validated
//! structurally; nothing here installs a logger.
//!
//! ```toml
//! [loggers.qwe]
//! level = "DEBUG"
//! handlers = ["console", "file"]
//!
//! [handlers.console]
//! kind = "stream"
//! level = "WARN"
//! formatter = "brief"
//! stream = "stderr"
//!
//! [handlers.file]
//! kind = "rotating-file"
//! level = "DEBUG"
//! formatter = "detailed"
//! path = "qwe.log"
//! max-bytes = 15728640
//! backup-count = 50
//!
//! [formatters.brief]
//! format = "{level}: {message}"
//! ```

pub mod template;
pub mod validate;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;

pub use template::{Field, Template, TemplateError};
pub use validate::{validate, LogConfigError, LogConfigReport};

/// Default file name looked up next to the manifest.
pub const LOGGING_CONFIG_NAME: &str = "logging.toml";

/// 15 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 15 * 1024 * 1024;

/// Rotated backups kept by the bundled file handler.
pub const DEFAULT_BACKUP_COUNT: u32 = 50;

/// Severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    #[default]
    NotSet,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::NotSet => "NOTSET",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTSET" => Ok(Level::NotSet),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" | "FATAL" => Ok(Level::Critical),
            _ => Err(format!(
                "invalid level '{}'; expected one of NOTSET, DEBUG, INFO, WARN, ERROR, CRITICAL",
                s
            )),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

/// A named logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: Level,

    /// Handler names, in order
    #[serde(default)]
    pub handlers: Vec<String>,

    /// Pass records on to ancestor loggers
    #[serde(default = "default_propagate")]
    pub propagate: bool,
}

fn default_propagate() -> bool {
    true
}

/// Handler variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerKind {
    /// Writes to a standard stream
    Stream,
    /// Writes to a file capped in size, keeping numbered backups
    RotatingFile,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Stream => f.write_str("stream"),
            HandlerKind::RotatingFile => f.write_str("rotating-file"),
        }
    }
}

/// Target of a stream handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamTarget {
    Stdout,
    Stderr,
}

/// How a rotating file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileMode {
    /// Append to an existing file
    #[default]
    #[serde(rename = "a")]
    Append,
    /// Truncate on open
    #[serde(rename = "w")]
    Truncate,
}

/// A handler.
///
/// Kind-specific arguments are optional at the type level; validation
/// checks that each kind has exactly the arguments it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HandlerConfig {
    pub kind: HandlerKind,

    #[serde(default)]
    pub level: Level,

    /// Formatter name
    pub formatter: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FileMode>,

    /// Rotate once the file reaches this size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,

    /// Number of rotated files kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_count: Option<u32>,
}

/// A formatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FormatterConfig {
    /// Template with `{field}` substitutions
    pub format: String,

    /// strftime-style pattern for `{timestamp}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datefmt: Option<String>,
}

/// The whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerConfig>,

    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,

    #[serde(default)]
    pub formatters: BTreeMap<String, FormatterConfig>,
}

impl LoggingConfig {
    /// Parse a document. Type errors (e.g. a negative `max-bytes`) fail
    /// here; cross-references are checked by [`validate`].
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse logging config: {}", path.display()))
    }

    /// Load and validate in one go.
    pub fn load_validated(path: &Path) -> Result<Self> {
        let config = Self::load(path)?;
        validate(&config)?;
        Ok(config)
    }
}

/// The bundled configuration: one logger, a console handler at WARN, a
/// rotating file handler at DEBUG (15 MiB, 50 backups), two formatters.
pub const DEFAULT_LOGGING_CONFIG: &str = r#"[loggers.qwe]
level = "DEBUG"
handlers = ["console", "file"]
propagate = false

[handlers.console]
kind = "stream"
level = "WARN"
formatter = "brief"
stream = "stderr"

[handlers.file]
kind = "rotating-file"
level = "DEBUG"
formatter = "detailed"
path = "qwe.log"
mode = "a"
max-bytes = 15728640
backup-count = 50

[formatters.brief]
format = "{level}: {message}"

[formatters.detailed]
format = "{timestamp} {level} {file}:{function}:{line} {message}"
datefmt = "%Y-%m-%d %H:%M:%S"
"#;
