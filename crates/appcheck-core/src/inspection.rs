//! Pod and container inspection through the container tool.

use appcheck_exec::{CommandExecutor, ExecError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::commands::OrchestratorCommand;
use crate::config::ToolPaths;
use crate::domain::{ContainerInspection, InspectionError, PodInspection};

#[derive(Debug, Default, Deserialize)]
struct RawContainerState {
    #[serde(rename = "RestartCount", default)]
    restart_count: u32,
}

#[derive(Debug, Default, Deserialize)]
struct RawContainerConfig {
    #[serde(rename = "Image", default)]
    image: String,
}

#[derive(Debug, Deserialize)]
struct RawContainerInspection {
    #[serde(rename = "State", default)]
    state: RawContainerState,
    #[serde(rename = "Config", default)]
    config: RawContainerConfig,
}

impl From<RawContainerInspection> for ContainerInspection {
    fn from(raw: RawContainerInspection) -> Self {
        Self {
            restart_count: raw.state.restart_count,
            image: raw.config.image,
        }
    }
}

/// Decode the first element of an inspect JSON array.
pub fn decode_first<T: DeserializeOwned>(target: &str, stdout: &str) -> Result<T, InspectionError> {
    if stdout.trim().is_empty() {
        return Err(InspectionError::EmptyOutput {
            target: target.to_string(),
        });
    }
    let records: Vec<T> = serde_json::from_str(stdout).map_err(|source| InspectionError::Decode {
        target: target.to_string(),
        source,
    })?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| InspectionError::NoRecords {
            target: target.to_string(),
        })
}

/// Runs inspection commands for one verification pass. No retries.
pub struct InspectionClient<'a> {
    executor: &'a dyn CommandExecutor,
    tools: &'a ToolPaths,
    timeout_secs: u64,
}

impl<'a> InspectionClient<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, tools: &'a ToolPaths, timeout_secs: u64) -> Self {
        Self {
            executor,
            tools,
            timeout_secs,
        }
    }

    async fn run(&self, command: OrchestratorCommand) -> Result<String, ExecError> {
        let spec = command.to_spec(self.tools, self.timeout_secs);
        let output = self.executor.execute(&spec).await?;
        output.into_stdout(&spec)
    }

    pub async fn inspect_pod(&self, pod: &str) -> Result<PodInspection, InspectionError> {
        let target = format!("pod {pod}");
        let stdout = self
            .run(OrchestratorCommand::PodInspect {
                pod: pod.to_string(),
            })
            .await
            .map_err(|source| InspectionError::Command {
                target: target.clone(),
                source,
            })?;
        let inspection: PodInspection = decode_first(&target, &stdout)?;
        debug!(
            pod = %pod,
            restart_policy = %inspection.restart_policy,
            containers = inspection.containers.len(),
            "Inspected pod"
        );
        Ok(inspection)
    }

    pub async fn inspect_container(&self, id: &str) -> Result<ContainerInspection, InspectionError> {
        let target = format!("container {id}");
        let stdout = self
            .run(OrchestratorCommand::ContainerInspect { id: id.to_string() })
            .await
            .map_err(|source| InspectionError::Command {
                target: target.clone(),
                source,
            })?;
        let raw: RawContainerInspection = decode_first(&target, &stdout)?;
        Ok(raw.into())
    }

    /// Raw `port` output for a container.
    pub async fn container_ports(&self, id: &str) -> Result<String, InspectionError> {
        self.run(OrchestratorCommand::ContainerPort { id: id.to_string() })
            .await
            .map_err(|source| InspectionError::Command {
                target: format!("container {id}"),
                source,
            })
    }
}
