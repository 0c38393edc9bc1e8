//! Wrapforge CLI - build SWIG extension modules from C++ sources

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wrapforge::builder::events::MessageFormat;
use wrapforge::core::workspace::ManifestError;
use wrapforge::logconf::LogConfigReport;
use wrapforge::util::diagnostic::{emit, suggestions, Diagnostic};
use wrapforge::PipelineError;

mod cli;
mod commands;

use cli::{BuildArgs, Cli, Commands};

/// Flags shared by every subcommand.
pub struct GlobalOptions {
    pub verbose: bool,
    pub manifest_path: Option<PathBuf>,
    pub message_format: MessageFormat,
}

fn main() {
    if let Err(e) = run() {
        std::process::exit(report_error(&e));
    }
}

/// Print `e` and return the exit status for it.
fn report_error(e: &anyhow::Error) -> i32 {
    let color = std::io::stderr().is_terminal();

    if let Some(pipeline) = e.chain().find_map(|c| c.downcast_ref::<PipelineError>()) {
        emit(&pipeline.to_diagnostic(), color);
        return pipeline.exit_code();
    }

    if let Some(missing) = e.chain().find_map(|c| c.downcast_ref::<ManifestError>()) {
        emit(
            &Diagnostic::error(missing.to_string()).with_suggestion(suggestions::NO_MANIFEST),
            color,
        );
        return 1;
    }

    if let Some(report) = e.chain().find_map(|c| c.downcast_ref::<LogConfigReport>()) {
        let handler = if color {
            miette::GraphicalReportHandler::new()
        } else {
            miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
        };
        let mut out = String::new();
        if handler.render_report(&mut out, report).is_ok() {
            eprint!("{}", out);
            return 1;
        }
    }

    eprintln!("error: {:#}", e);
    1
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("wrapforge=debug")
    } else {
        EnvFilter::new("wrapforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = GlobalOptions {
        verbose: cli.verbose,
        manifest_path: cli.manifest_path,
        message_format: cli.message_format,
    };

    match cli.command {
        None => commands::build::execute(BuildArgs::default(), &global),
        Some(Commands::Build(args)) => commands::build::execute(args, &global),
        Some(Commands::Smart(args)) => commands::smart::execute(args, &global),
        Some(Commands::Clean) => commands::clean::execute(&global),
        Some(Commands::Tidy) => commands::tidy::execute(&global),
        Some(Commands::Plan) => commands::plan::execute(&global),
        Some(Commands::Init(args)) => commands::init::execute(args),
        Some(Commands::Logconf(args)) => commands::logconf::execute(args, &global),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
    }
}
