//! Pod status rows and inspection records.

use serde::{Deserialize, Serialize};

/// Status prefix reported for a running pod whose health check passes.
pub const HEALTHY_STATUS_PREFIX: &str = "Running (healthy)";

/// Status reported for a pod that was created but never started.
pub const CREATED_STATUS: &str = "Created";

/// Restart policy under which containers are never restarted.
pub const RESTART_POLICY_NO: &str = "no";

/// One row of the application status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    /// Application column, absent on continuation rows.
    pub application_name: Option<String>,
    pub pod_name: String,
    /// Free-text status, trimmed.
    pub status: String,
    /// Soft signal parsed from a `restarts: N` marker in the status; 0 if absent.
    pub restart_count: u32,
}

impl StatusRow {
    /// Healthy iff the status begins with `Running (healthy)` or is exactly `Created`.
    pub fn is_healthy(&self) -> bool {
        status_is_healthy(&self.status)
    }
}

/// Health classification of a raw status string.
pub fn status_is_healthy(status: &str) -> bool {
    status.starts_with(HEALTHY_STATUS_PREFIX) || status == CREATED_STATUS
}

/// Member container reference from a pod inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodContainer {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Decoded `pod inspect` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInspection {
    #[serde(rename = "RestartPolicy", default)]
    pub restart_policy: String,
    #[serde(rename = "Containers", default)]
    pub containers: Vec<PodContainer>,
}

impl PodInspection {
    /// Whether the pod's restart policy is `"no"`.
    pub fn never_restarts(&self) -> bool {
        self.restart_policy == RESTART_POLICY_NO
    }
}

/// Decoded container `inspect` record, reduced to the fields the checks use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInspection {
    pub restart_count: u32,
    pub image: String,
}
