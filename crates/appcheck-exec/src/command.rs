//! Command descriptions.

use serde::{Deserialize, Serialize};

/// Default per-command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One external command invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSpec {
    /// Short label used in logs (e.g. `pod_inspect`).
    pub label: String,

    /// Executable name or path.
    pub program: String,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// Timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
}

impl CommandSpec {
    /// Create a command with the default timeout.
    pub fn new<I, S>(label: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Render the command line as a single string (program followed by args).
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_joins_program_and_args() {
        let spec = CommandSpec::new("pod_inspect", "podman", ["pod", "inspect", "demo--ui"]);
        assert_eq!(spec.command_line(), "podman pod inspect demo--ui");
        assert_eq!(spec.to_string(), "podman pod inspect demo--ui");
    }

    #[test]
    fn test_default_timeout() {
        let spec = CommandSpec::new("ps", "ai-services", ["application", "ps"]);
        assert_eq!(spec.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_with_timeout_overrides() {
        let spec = CommandSpec::new("port", "podman", ["port", "abc"]).with_timeout(5);
        assert_eq!(spec.timeout_secs, 5);
        assert_eq!(spec.label, "port");
    }

    #[test]
    fn test_no_args_renders_program_only() {
        let spec = CommandSpec::new("version", "podman", Vec::<String>::new());
        assert_eq!(spec.command_line(), "podman");
    }
}
