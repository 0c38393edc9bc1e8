//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use wrapforge::builder::events::MessageFormat;

/// Wrapforge - build SWIG extension modules from C++ sources
#[derive(Parser)]
#[command(name = "wrapforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to Wrapforge.toml (defaults to searching upward from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Output format for build events: human or json
    #[arg(long, global = true, default_value = "human", value_name = "FMT")]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring targets up to date (default: the shared module and its stub)
    #[command(visible_alias = "all")]
    Build(BuildArgs),

    /// Build everything, then remove intermediates
    Smart(SmartArgs),

    /// Remove final targets (shared module and Python stub)
    Clean,

    /// Remove intermediates only (objects, generated wrapper source)
    Tidy,

    /// Print the build graph as JSON
    Plan,

    /// Write a Wrapforge.toml into a directory
    Init(InitArgs),

    /// Inspect a logging config
    Logconf(LogconfArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Default)]
pub struct BuildArgs {
    /// Outputs to bring up to date, by path or file name
    pub targets: Vec<String>,

    /// Print the commands that would run without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct SmartArgs {
    /// Print the commands that would run without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct InitArgs {
    /// Module name
    #[arg(long)]
    pub name: Option<String>,

    /// Overwrite an existing manifest
    #[arg(long)]
    pub force: bool,

    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct LogconfArgs {
    #[command(subcommand)]
    pub command: LogconfCommands,
}

#[derive(Subcommand)]
pub enum LogconfCommands {
    /// Validate a logging config
    Check(LogconfPathArgs),

    /// Print a validated logging config as JSON
    Show(LogconfPathArgs),

    /// Write the bundled logging config
    Init(LogconfInitArgs),
}

#[derive(Args)]
pub struct LogconfPathArgs {
    /// Config file (defaults to logging.toml next to the manifest, or in the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct LogconfInitArgs {
    /// Destination (defaults to ./logging.toml)
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
