//! Subprocess invocations used by the deployment checks.

use appcheck_exec::CommandSpec;
use serde::{Deserialize, Serialize};

use crate::config::ToolPaths;

/// The fixed set of external queries issued against a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OrchestratorCommand {
    /// `<app-cli> application ps <application>`
    ApplicationPs { application: String },

    /// `podman pod inspect <pod>`
    PodInspect { pod: String },

    /// `podman inspect <id>`
    ContainerInspect { id: String },

    /// `podman port <id>`
    ContainerPort { id: String },
}

impl OrchestratorCommand {
    /// Label used in logs and command output.
    pub fn label(&self) -> &'static str {
        match self {
            OrchestratorCommand::ApplicationPs { .. } => "application_ps",
            OrchestratorCommand::PodInspect { .. } => "pod_inspect",
            OrchestratorCommand::ContainerInspect { .. } => "container_inspect",
            OrchestratorCommand::ContainerPort { .. } => "container_port",
        }
    }

    fn argv(&self, tools: &ToolPaths) -> (String, Vec<String>) {
        match self {
            OrchestratorCommand::ApplicationPs { application } => (
                tools.app_cli.clone(),
                vec!["application".to_string(), "ps".to_string(), application.clone()],
            ),
            OrchestratorCommand::PodInspect { pod } => (
                tools.podman.clone(),
                vec!["pod".to_string(), "inspect".to_string(), pod.clone()],
            ),
            OrchestratorCommand::ContainerInspect { id } => (
                tools.podman.clone(),
                vec!["inspect".to_string(), id.clone()],
            ),
            OrchestratorCommand::ContainerPort { id } => {
                (tools.podman.clone(), vec!["port".to_string(), id.clone()])
            }
        }
    }

    /// Render into an executable spec with the given timeout.
    pub fn to_spec(&self, tools: &ToolPaths, timeout_secs: u64) -> CommandSpec {
        let (program, args) = self.argv(tools);
        CommandSpec::new(self.label(), program, args).with_timeout(timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolPaths {
        ToolPaths {
            app_cli: "ai-services".to_string(),
            podman: "podman".to_string(),
        }
    }

    #[test]
    fn test_command_lines() {
        let cases = [
            (
                OrchestratorCommand::ApplicationPs {
                    application: "demo".to_string(),
                },
                "ai-services application ps demo",
            ),
            (
                OrchestratorCommand::PodInspect {
                    pod: "demo--milvus".to_string(),
                },
                "podman pod inspect demo--milvus",
            ),
            (
                OrchestratorCommand::ContainerInspect {
                    id: "abc123".to_string(),
                },
                "podman inspect abc123",
            ),
            (
                OrchestratorCommand::ContainerPort {
                    id: "abc123".to_string(),
                },
                "podman port abc123",
            ),
        ];
        for (command, expected) in cases {
            assert_eq!(command.to_spec(&tools(), 30).command_line(), expected);
        }
    }

    #[test]
    fn test_spec_carries_label_and_timeout() {
        let spec = OrchestratorCommand::PodInspect {
            pod: "demo--ui".to_string(),
        }
        .to_spec(&tools(), 15);
        assert_eq!(spec.label, "pod_inspect");
        assert_eq!(spec.timeout_secs, 15);
    }

    #[test]
    fn test_custom_tool_paths() {
        let tools = ToolPaths {
            app_cli: "/opt/bin/appctl".to_string(),
            podman: "/usr/bin/podman".to_string(),
        };
        let spec = OrchestratorCommand::ApplicationPs {
            application: "demo".to_string(),
        }
        .to_spec(&tools, 60);
        assert_eq!(spec.command_line(), "/opt/bin/appctl application ps demo");
    }
}
