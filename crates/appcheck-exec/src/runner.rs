//! Command execution.

use crate::command::CommandSpec;
use crate::error::ExecError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Label copied from the spec.
    pub label: String,

    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the process reported success.
    pub success: bool,
}

impl CommandOutput {
    /// Build a successful output carrying `stdout`.
    pub fn ok(label: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
            success: true,
        }
    }

    /// Build a failed output with the given exit code and stderr.
    pub fn failed(label: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
            success: false,
        }
    }

    /// Whether this command passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// Return stdout, or a `NonZeroExit` error if the command failed.
    pub fn into_stdout(self, spec: &CommandSpec) -> Result<String, ExecError> {
        if self.passed() {
            Ok(self.stdout)
        } else {
            Err(ExecError::NonZeroExit {
                command: spec.command_line(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs a [`CommandSpec`] and captures its output.
///
/// Implementations report a non-zero exit as `Ok` with `success == false`;
/// only failures to run the command at all are errors.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Executor that spawns real processes via `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let start = Instant::now();

        if spec.program.is_empty() {
            return Err(ExecError::EmptyCommand {
                label: spec.label.clone(),
            });
        }

        debug!(label = %spec.label, command = %spec, "Executing command");

        let spawn_err = |source| ExecError::Spawn {
            command: spec.command_line(),
            source,
        };

        // kill_on_drop makes a timed-out wait cancel the child.
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        let output = if spec.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(spec.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| ExecError::Timeout {
                command: spec.command_line(),
                timeout_secs: spec.timeout_secs,
            })?
            .map_err(spawn_err)?
        } else {
            child.wait_with_output().await.map_err(spawn_err)?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(CommandOutput {
            label: spec.label.clone(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
            success: output.status.success(),
        })
    }
}
