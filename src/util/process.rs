//! Subprocess execution for pipeline tools.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::builder::errors::PipelineError;

/// Exit status reported when a tool could not be spawned at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

/// Captured result of a tool run that exited successfully.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Run the tool to completion.
    ///
    /// A spawn failure or nonzero exit is reported as
    /// [`PipelineError::ToolFailure`] carrying the tool's exit status.
    pub fn exec_and_check(&self) -> Result<ToolOutput, PipelineError> {
        let output: Output = match self.build_command().output() {
            Ok(output) => output,
            Err(e) => {
                return Err(PipelineError::ToolFailure {
                    command: self.display_command(),
                    code: Some(SPAWN_FAILURE_CODE),
                    stderr: format!("failed to spawn `{}`: {}", self.program.display(), e),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(PipelineError::ToolFailure {
                command: self.display_command(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }

    /// Display the command for logs and error messages. Arguments are
    /// passed to the tool unchanged; only this rendering is lossy.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Resolve a configured tool name against the project root.
///
/// Names containing a path separator are taken relative to `root`; bare
/// names are looked up on PATH and left untouched when not found, so the
/// spawn failure surfaces as a tool failure at run time.
pub fn resolve_tool(root: &Path, tool: &Path) -> PathBuf {
    if tool.is_absolute() {
        return tool.to_path_buf();
    }
    if tool.components().count() > 1 {
        return root.join(tool);
    }
    let name = tool.to_string_lossy();
    find_executable(&name).unwrap_or_else(|| tool.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_captures_stdout() {
        let output = ProcessBuilder::new("echo").arg("hello").exec_and_check().unwrap();
        assert!(output.stdout.contains("hello"));
    }

    #[test]
    fn test_nonzero_exit_is_tool_failure() {
        let err = ProcessBuilder::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .exec_and_check()
            .unwrap_err();

        match err {
            PipelineError::ToolFailure { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_reports_spawn_code() {
        let err = ProcessBuilder::new("definitely-not-a-real-tool-xyz")
            .exec_and_check()
            .unwrap_err();
        assert_eq!(err.exit_code(), SPAWN_FAILURE_CODE);
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("g++").args(["-c", "-fPIC", "a.cpp", "-o", "a.o"]);
        assert_eq!(pb.display_command(), "g++ -c -fPIC a.cpp -o a.o");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_reaches_tool_intact() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"a\xffb");
        let pb = ProcessBuilder::new("sh").args([
            OsStr::new("-c"),
            OsStr::new("printf %s \"$1\" | od -An -tx1"),
            OsStr::new("sh"),
            raw,
        ]);
        assert_eq!(pb.args[3].as_bytes(), b"a\xffb");
        assert_eq!(pb.display_command(), "sh -c printf %s \"$1\" | od -An -tx1 sh a\u{fffd}b");

        let output = pb.exec_and_check().unwrap();
        assert_eq!(
            output.stdout.split_whitespace().collect::<Vec<_>>(),
            ["61", "ff", "62"]
        );
    }

    #[test]
    fn test_resolve_tool_relative_path() {
        let root = Path::new("/project");
        assert_eq!(
            resolve_tool(root, Path::new("tools/swig")),
            PathBuf::from("/project/tools/swig")
        );
        assert_eq!(
            resolve_tool(root, Path::new("/opt/bin/swig")),
            PathBuf::from("/opt/bin/swig")
        );
    }
}
