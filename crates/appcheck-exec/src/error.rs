//! Error types for subprocess execution.

use thiserror::Error;

/// Errors raised while running an external command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The command vector had no program.
    #[error("command '{label}' has no program")]
    EmptyCommand { label: String },

    /// The process could not be spawned or awaited.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish before its deadline and was killed.
    #[error("'{command}' timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    /// The process exited with a non-zero status.
    #[error("'{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// A scripted fake had no response for the command.
    #[error("no scripted response for '{command}'")]
    Unscripted { command: String },
}
