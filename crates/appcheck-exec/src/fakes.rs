//! In-memory command executor (testing only)
//!
//! `ScriptedExecutor` answers commands from a table keyed by the rendered
//! command line and records every call in order.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::runner::{CommandExecutor, CommandOutput};

#[derive(Debug, Clone)]
enum Scripted {
    Output { exit_code: i32, stdout: String, stderr: String },
    Timeout,
}

/// Fake executor returning canned output per command line.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `command_line` with a successful exit and the given stdout.
    pub fn on(self, command_line: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.insert(
            command_line,
            Scripted::Output {
                exit_code: 0,
                stdout: stdout.into(),
                stderr: String::new(),
            },
        )
    }

    /// Respond to `command_line` with a failing exit code and stderr.
    pub fn on_failure(
        self,
        command_line: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.insert(
            command_line,
            Scripted::Output {
                exit_code,
                stdout: String::new(),
                stderr: stderr.into(),
            },
        )
    }

    /// Respond to `command_line` with a timeout error.
    pub fn on_timeout(self, command_line: impl Into<String>) -> Self {
        self.insert(command_line, Scripted::Timeout)
    }

    /// Command lines executed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of times `command_line` was executed.
    pub fn call_count(&self, command_line: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command_line)
            .count()
    }

    fn insert(self, command_line: impl Into<String>, response: Scripted) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(command_line.into(), response);
        self
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let line = spec.command_line();
        self.calls.lock().unwrap().push(line.clone());

        let response = self.responses.lock().unwrap().get(&line).cloned();
        match response {
            Some(Scripted::Output {
                exit_code,
                stdout,
                stderr,
            }) => Ok(CommandOutput {
                label: spec.label.clone(),
                exit_code,
                stdout,
                stderr,
                duration_ms: 0,
                success: exit_code == 0,
            }),
            Some(Scripted::Timeout) => Err(ExecError::Timeout {
                command: line,
                timeout_secs: spec.timeout_secs,
            }),
            None => Err(ExecError::Unscripted { command: line }),
        }
    }
}
