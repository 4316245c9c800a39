//! External process invocation.
//!
//! The orchestrator never spawns processes itself. It hands a
//! [`ToolInvocation`] to a [`ToolRunner`] and gets back a [`ToolOutput`],
//! leaving "is this exit code acceptable" to the caller.

use crate::DeployError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// A program with arguments, ready to run.
///
/// ```rust
/// use office_deploy::ToolInvocation;
///
/// let inv = ToolInvocation::new("setup.exe")
///     .arg("/configure")
///     .arg("configuration.xml");
/// assert_eq!(inv.to_string(), "setup.exe /configure configuration.xml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// File name of the program, for log fields.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was terminated without one.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// An output with the given exit code and no captured text.
    pub fn with_code(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Default::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code with `-1` standing in for "none".
    pub fn code(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }
}

/// Blocking invocation of an external program.
///
/// `Err` means the process could not be started at all; a started process
/// always yields `Ok`, whatever its exit code.
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DeployError>;
}

impl<R: ToolRunner> ToolRunner for &R {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DeployError> {
        (**self).run(invocation).await
    }
}

/// [`ToolRunner`] that spawns real processes and waits for them.
///
/// No timeout is applied; the deployment tool owns its own lifecycle and
/// cannot be safely interrupted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DeployError> {
        let program = resolve_program(&invocation.program)?;
        tracing::info!(command = %invocation, "running external tool");

        let mut command = Command::new(&program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| DeployError::launch(invocation.program_name(), &e))?;

        let result = ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            program = %invocation.program_name(),
            exit_code = ?result.exit_code,
            "external tool finished"
        );
        Ok(result)
    }
}

/// Bare program names are looked up on PATH; paths are used as given.
fn resolve_program(program: &Path) -> Result<PathBuf, DeployError> {
    if program.components().count() > 1 || program.is_absolute() {
        return Ok(program.to_path_buf());
    }
    which::which(program).map_err(|e| DeployError::Launch {
        program: program.display().to_string(),
        message: e.to_string(),
        fix: format!("Install {} or add it to PATH", program.display()),
    })
}
