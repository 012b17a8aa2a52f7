//! Child process execution.

use super::command::ToolCommand;
use crate::model::Step;
use anyhow::{Context, Result};
use std::fmt;
use std::process::{ExitStatus, Stdio};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Success,
    Code(i32),
    /// Terminated by a signal (Unix only).
    Signal(i32),
}

impl ChildExit {
    pub fn success(self) -> bool {
        matches!(self, ChildExit::Success)
    }

    /// Exit code the launcher should terminate with to mirror this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            ChildExit::Success => 0,
            ChildExit::Code(code) => code,
            // Shell convention (128 + N), so callers see e.g. 137 for SIGKILL.
            ChildExit::Signal(sig) => 128 + sig,
        }
    }
}

impl From<ExitStatus> for ChildExit {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            return ChildExit::Success;
        }
        if let Some(code) = status.code() {
            return ChildExit::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ChildExit::Signal(sig);
            }
        }
        ChildExit::Code(1)
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildExit::Success => f.write_str("exited successfully"),
            ChildExit::Code(code) => write!(f, "exited with status {code}"),
            ChildExit::Signal(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

/// An external step ended unsuccessfully. The launcher exits with the child's code.
#[derive(Debug, thiserror::Error)]
#[error("{step} step failed: tool {exit}")]
pub struct StepFailed {
    pub step: Step,
    pub exit: ChildExit,
}

impl StepFailed {
    pub fn exit_code(&self) -> i32 {
        self.exit.exit_code()
    }
}

/// Runs a tool command to completion.
pub trait Executor {
    async fn run(&mut self, cmd: &ToolCommand) -> Result<ChildExit>;
}

/// Spawns the real tool and waits for it, inheriting the terminal.
#[derive(Debug, Default)]
pub struct ProcessExecutor {
    child_stdout_to_stderr: bool,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the child's stdout to our stderr, keeping stdout free for machine-readable output.
    pub fn child_stdout_to_stderr(mut self, yes: bool) -> Self {
        self.child_stdout_to_stderr = yes;
        self
    }
}

impl Executor for ProcessExecutor {
    async fn run(&mut self, cmd: &ToolCommand) -> Result<ChildExit> {
        let mut command = tokio::process::Command::new(&cmd.program);
        command.args(&cmd.args);
        if self.child_stdout_to_stderr {
            command.stdout(Stdio::from(std::io::stderr()));
        }
        let status = command
            .status()
            .await
            .with_context(|| format!("failed to launch `{}`", cmd.program))?;
        log::debug!("`{}` {}", cmd.program, ChildExit::from(status));
        Ok(status.into())
    }
}

/// Reports success for every command without spawning anything.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    async fn run(&mut self, cmd: &ToolCommand) -> Result<ChildExit> {
        log::debug!("dry run, not launching `{}`", cmd.program);
        Ok(ChildExit::Success)
    }
}
