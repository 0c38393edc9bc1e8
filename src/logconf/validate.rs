//! Structural validation of a [`LoggingConfig`].
//!
//! Every problem is collected rather than stopping at the first, so a
//! single `wrapforge logconf check` shows everything wrong with a file.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use super::template::{Field, Template, TemplateError};
use super::{HandlerKind, LoggingConfig};

/// One problem found in a logging config.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum LogConfigError {
    #[error("handler `{handler}` references undeclared formatter `{formatter}`")]
    #[diagnostic(
        code(wrapforge::logconf::unknown_formatter),
        help("Declare it under [formatters.{formatter}] or point the handler at an existing one")
    )]
    UnknownFormatter { handler: String, formatter: String },

    #[error("logger `{logger}` references undeclared handler `{handler}`")]
    #[diagnostic(
        code(wrapforge::logconf::unknown_handler),
        help("Declare it under [handlers.{handler}]")
    )]
    UnknownHandler { logger: String, handler: String },

    #[error("logger `{logger}` has no handlers")]
    #[diagnostic(code(wrapforge::logconf::no_handlers))]
    LoggerWithoutHandlers { logger: String },

    #[error("{kind} handler `{handler}` is missing `{argument}`")]
    #[diagnostic(code(wrapforge::logconf::missing_argument))]
    MissingArgument {
        handler: String,
        kind: HandlerKind,
        argument: &'static str,
    },

    #[error("{kind} handler `{handler}` does not take `{argument}`")]
    #[diagnostic(code(wrapforge::logconf::unexpected_argument))]
    UnexpectedArgument {
        handler: String,
        kind: HandlerKind,
        argument: &'static str,
    },

    #[error("handler `{handler}` has an empty `path`")]
    #[diagnostic(code(wrapforge::logconf::empty_path))]
    EmptyPath { handler: String },

    #[error("formatter `{formatter}` has an invalid template")]
    #[diagnostic(
        code(wrapforge::logconf::bad_template),
        help("Known fields: timestamp level logger file function line message. Double a brace to write it literally")
    )]
    BadTemplate {
        formatter: String,
        #[source]
        cause: TemplateError,
    },

    #[error("no loggers are declared")]
    #[diagnostic(code(wrapforge::logconf::no_loggers))]
    NoLoggers,
}

/// Every problem found in one config.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid logging config ({} problem(s))", errors.len())]
#[diagnostic(code(wrapforge::logconf::invalid))]
pub struct LogConfigReport {
    #[related]
    pub errors: Vec<LogConfigError>,
}

/// Check cross-references and per-kind arguments.
pub fn validate(config: &LoggingConfig) -> Result<(), LogConfigReport> {
    let mut errors = Vec::new();

    if config.loggers.is_empty() {
        errors.push(LogConfigError::NoLoggers);
    }

    for (name, logger) in &config.loggers {
        if logger.handlers.is_empty() {
            errors.push(LogConfigError::LoggerWithoutHandlers {
                logger: name.clone(),
            });
        }
        for handler in &logger.handlers {
            if !config.handlers.contains_key(handler) {
                errors.push(LogConfigError::UnknownHandler {
                    logger: name.clone(),
                    handler: handler.clone(),
                });
            }
        }
    }

    for (name, handler) in &config.handlers {
        if !config.formatters.contains_key(&handler.formatter) {
            errors.push(LogConfigError::UnknownFormatter {
                handler: name.clone(),
                formatter: handler.formatter.clone(),
            });
        }

        let missing = |argument| LogConfigError::MissingArgument {
            handler: name.clone(),
            kind: handler.kind,
            argument,
        };
        let unexpected = |argument| LogConfigError::UnexpectedArgument {
            handler: name.clone(),
            kind: handler.kind,
            argument,
        };

        match handler.kind {
            HandlerKind::Stream => {
                if handler.stream.is_none() {
                    errors.push(missing("stream"));
                }
                for (present, argument) in [
                    (handler.path.is_some(), "path"),
                    (handler.mode.is_some(), "mode"),
                    (handler.max_bytes.is_some(), "max-bytes"),
                    (handler.backup_count.is_some(), "backup-count"),
                ] {
                    if present {
                        errors.push(unexpected(argument));
                    }
                }
            }
            HandlerKind::RotatingFile => {
                match &handler.path {
                    None => errors.push(missing("path")),
                    Some(p) if p.as_os_str().is_empty() => errors.push(LogConfigError::EmptyPath {
                        handler: name.clone(),
                    }),
                    Some(_) => {}
                }
                // max-bytes = 0 disables rotation.
                if handler.max_bytes.is_none() {
                    errors.push(missing("max-bytes"));
                }
                if handler.backup_count.is_none() {
                    errors.push(missing("backup-count"));
                }
                if handler.stream.is_some() {
                    errors.push(unexpected("stream"));
                }
            }
        }
    }

    for (name, formatter) in &config.formatters {
        match Template::parse(&formatter.format) {
            Ok(template) => {
                if formatter.datefmt.is_some() && !template.fields().contains(&Field::Timestamp) {
                    tracing::warn!("formatter `{}` sets `datefmt` but never prints {{timestamp}}", name);
                }
            }
            Err(cause) => errors.push(LogConfigError::BadTemplate {
                formatter: name.clone(),
                cause,
            }),
        }
    }

    if errors.is_empty() {
        tracing::debug!(
            "logging config ok: {} logger(s), {} handler(s), {} formatter(s)",
            config.loggers.len(),
            config.handlers.len(),
            config.formatters.len()
        );
        Ok(())
    } else {
        Err(LogConfigReport { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logconf::{DEFAULT_LOGGING_CONFIG, DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES};

    fn default_config() -> LoggingConfig {
        LoggingConfig::parse(DEFAULT_LOGGING_CONFIG).unwrap()
    }

    fn errors_of(config: &LoggingConfig) -> Vec<LogConfigError> {
        validate(config).unwrap_err().errors
    }

    #[test]
    fn test_default_config_validates() {
        let config = default_config();
        validate(&config).unwrap();

        let file = &config.handlers["file"];
        assert_eq!(file.max_bytes, Some(DEFAULT_MAX_BYTES));
        assert_eq!(DEFAULT_MAX_BYTES, 15_728_640);
        assert_eq!(file.backup_count, Some(DEFAULT_BACKUP_COUNT));
        assert_eq!(DEFAULT_BACKUP_COUNT, 50);
    }

    #[test]
    fn test_undeclared_formatter_is_rejected() {
        let mut config = default_config();
        config.formatters.remove("detailed");

        assert_eq!(
            errors_of(&config),
            vec![LogConfigError::UnknownFormatter {
                handler: "file".to_string(),
                formatter: "detailed".to_string(),
            }]
        );
    }

    #[test]
    fn test_undeclared_handler_is_rejected() {
        let mut config = default_config();
        config.handlers.remove("console");

        assert_eq!(
            errors_of(&config),
            vec![LogConfigError::UnknownHandler {
                logger: "qwe".to_string(),
                handler: "console".to_string(),
            }]
        );
    }

    #[test]
    fn test_rotating_file_requires_size_arguments() {
        let mut config = default_config();
        let file = config.handlers.get_mut("file").unwrap();
        file.max_bytes = None;
        file.backup_count = None;

        let errors = errors_of(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(
            e,
            LogConfigError::MissingArgument { argument: "max-bytes", .. }
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            LogConfigError::MissingArgument { argument: "backup-count", .. }
        )));
    }

    #[test]
    fn test_stream_handler_rejects_file_arguments() {
        let mut config = default_config();
        config.handlers.get_mut("console").unwrap().max_bytes = Some(10);

        assert_eq!(
            errors_of(&config),
            vec![LogConfigError::UnexpectedArgument {
                handler: "console".to_string(),
                kind: HandlerKind::Stream,
                argument: "max-bytes",
            }]
        );
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let mut config = default_config();
        config.handlers.get_mut("file").unwrap().path = Some(Default::default());

        assert_eq!(
            errors_of(&config),
            vec![LogConfigError::EmptyPath {
                handler: "file".to_string()
            }]
        );
    }

    #[test]
    fn test_zero_sizes_disable_rotation() {
        let mut config = default_config();
        let file = config.handlers.get_mut("file").unwrap();
        file.max_bytes = Some(0);
        file.backup_count = Some(0);

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bad_template_is_rejected() {
        let mut config = default_config();
        config.formatters.get_mut("brief").unwrap().format = "%(levelname)s {msg}".to_string();

        let errors = errors_of(&config);
        assert!(matches!(
            &errors[..],
            [LogConfigError::BadTemplate { formatter, cause: TemplateError::UnknownField { .. } }]
                if formatter == "brief"
        ));
    }

    #[test]
    fn test_datefmt_without_timestamp_is_accepted() {
        let mut config = default_config();
        config.formatters.get_mut("brief").unwrap().datefmt = Some("%H:%M".to_string());

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_all_problems_are_collected() {
        let config = LoggingConfig::parse(
            r#"
[loggers.a]
handlers = ["missing"]

[loggers.b]

[handlers.h]
kind = "stream"
formatter = "nope"
"#,
        )
        .unwrap();

        let errors = errors_of(&config);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_empty_document_has_no_loggers() {
        let config = LoggingConfig::parse("").unwrap();
        assert_eq!(errors_of(&config), vec![LogConfigError::NoLoggers]);
    }

    #[test]
    fn test_report_message_counts_problems() {
        let config = LoggingConfig::parse("").unwrap();
        let report = validate(&config).unwrap_err();
        assert_eq!(report.to_string(), "invalid logging config (1 problem(s))");
    }
}
