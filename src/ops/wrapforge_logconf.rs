//! Implementation of `wrapforge logconf`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::logconf::{LoggingConfig, DEFAULT_LOGGING_CONFIG};
use crate::util::diagnostic::suggestions;
use crate::util::fs::write_string;

/// Counts reported by a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfigSummary {
    pub loggers: usize,
    pub handlers: usize,
    pub formatters: usize,
}

impl std::fmt::Display for LogConfigSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} logger(s), {} handler(s), {} formatter(s)",
            self.loggers, self.handlers, self.formatters
        )
    }
}

/// Load and validate the config at `path`.
pub fn check(path: &Path) -> Result<LogConfigSummary> {
    let config = load(path)?;
    Ok(LogConfigSummary {
        loggers: config.loggers.len(),
        handlers: config.handlers.len(),
        formatters: config.formatters.len(),
    })
}

/// Load and validate the config at `path`, rendered as pretty JSON.
pub fn show(path: &Path) -> Result<String> {
    let config = load(path)?;
    Ok(serde_json::to_string_pretty(&config)?)
}

fn load(path: &Path) -> Result<LoggingConfig> {
    if !path.exists() {
        bail!(
            "logging config `{}` does not exist\n{}",
            path.display(),
            suggestions::NO_LOGGING_CONFIG
        );
    }
    LoggingConfig::load_validated(path)
}

/// Write the bundled config to `path`.
pub fn init(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        bail!(
            "`{}` already exists\n\
             \n\
             Use `wrapforge logconf init --force` to overwrite it.",
            path.display()
        );
    }
    write_string(path, DEFAULT_LOGGING_CONFIG)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logconf::LogConfigReport;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_check() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logging.toml");
        init(&path, false).unwrap();

        let summary = check(&path).unwrap();
        assert_eq!(summary.to_string(), "1 logger(s), 2 handler(s), 2 formatter(s)");
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logging.toml");
        std::fs::write(&path, "keep").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep");

        init(&path, true).unwrap();
        assert!(check(&path).is_ok());
    }

    #[test]
    fn test_check_reports_structural_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logging.toml");
        std::fs::write(
            &path,
            DEFAULT_LOGGING_CONFIG.replace("formatter = \"brief\"", "formatter = \"terse\""),
        )
        .unwrap();

        let err = check(&path).unwrap_err();
        let report = err.downcast_ref::<LogConfigReport>().unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].to_string().contains("`terse`"));
    }

    #[test]
    fn test_show_emits_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logging.toml");
        init(&path, false).unwrap();

        let json: serde_json::Value = serde_json::from_str(&show(&path).unwrap()).unwrap();
        assert_eq!(json["handlers"]["file"]["backup-count"], 50);
        assert_eq!(json["handlers"]["console"]["level"], "WARN");
    }

    #[test]
    fn test_check_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = check(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("logconf init"));
    }
}
