//! Command generation for the binding generator and the C++ toolchain.
//!
//! Commands are plain data: the plan records them and the executor runs
//! them. Paths are relative to the project root, which is the working
//! directory of every tool invocation, so the same inputs always produce
//! the same command lines.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::manifest::{BindingLanguage, ToolsConfig};

/// A command to execute: program and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// The program to run, as configured (resolved at execution time)
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Render as a single shell-like line.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Input for the binding generator step.
#[derive(Debug, Clone)]
pub struct GenerateInput {
    /// Interface description file
    pub interface: PathBuf,
    /// Generated wrapper source
    pub wrapper_source: PathBuf,
    /// Directory for the generated language stub
    pub out_dir: PathBuf,
    /// Target binding language
    pub language: BindingLanguage,
}

/// Input for a compile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Header search path
    pub include_dirs: Vec<PathBuf>,
}

/// Input for the final link step.
#[derive(Debug, Clone)]
pub struct LinkInput {
    /// Object files, in link order
    pub objects: Vec<PathBuf>,
    /// Output shared module
    pub output: PathBuf,
}

/// A native compiler driver that can build position-independent objects
/// and link them into a shared module.
pub trait Toolchain {
    /// Generate a compile command producing a position-independent object.
    fn compile_command(&self, input: &CompileInput) -> CommandSpec;

    /// Generate a link command producing a shared module.
    fn link_command(&self, input: &LinkInput) -> CommandSpec;
}

/// GCC/Clang-style compiler driver.
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the C++ compiler
    pub cxx: PathBuf,
    /// Extra flags appended to every compile
    pub cxxflags: Vec<String>,
    /// Extra flags appended to the link
    pub ldflags: Vec<String>,
}

impl GccToolchain {
    /// Build a toolchain from the manifest's `[tools]` table.
    pub fn from_tools(tools: &ToolsConfig) -> Self {
        GccToolchain {
            cxx: tools.cxx.clone(),
            cxxflags: tools.cxxflags.clone(),
            ldflags: tools.ldflags.clone(),
        }
    }
}

impl Toolchain for GccToolchain {
    fn compile_command(&self, input: &CompileInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cxx).arg("-c").arg("-fPIC");

        cmd = cmd.args(self.cxxflags.iter().cloned());

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        cmd.arg(path_arg(&input.source))
            .arg("-o")
            .arg(path_arg(&input.output))
    }

    fn link_command(&self, input: &LinkInput) -> CommandSpec {
        CommandSpec::new(&self.cxx)
            .arg("-shared")
            .args(input.objects.iter().map(|o| path_arg(o)))
            .args(self.ldflags.iter().cloned())
            .arg("-o")
            .arg(path_arg(&input.output))
    }
}

/// The SWIG binding generator.
#[derive(Debug, Clone)]
pub struct Swig {
    /// Path to the swig executable
    pub program: PathBuf,
}

impl Swig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Swig {
            program: program.into(),
        }
    }

    /// Generate the binding command (C++ mode, fixed language flag).
    pub fn generate_command(&self, input: &GenerateInput) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("-c++")
            .arg(input.language.swig_flag())
            .arg("-o")
            .arg(path_arg(&input.wrapper_source))
            .arg("-outdir")
            .arg(path_arg(&input.out_dir))
            .arg(path_arg(&input.interface))
    }
}
