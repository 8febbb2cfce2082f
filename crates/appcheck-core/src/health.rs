//! Deployment health verification.
//!
//! A pass checks three things in order: every listed pod reports a healthy
//! status, every pod the template requires exists, and none of the required
//! pods has restarted.

use std::time::Instant;

use appcheck_exec::CommandExecutor;
use serde::{Deserialize, Serialize};

use crate::context::RunContext;
use crate::domain::{
    AssertionFailure, CheckOutcome, ExpectedTopology, InspectionError, StatusRow, VerifyError,
};
use crate::inspection::InspectionClient;
use crate::obs;
use crate::status_table::query_status_rows;

pub const HEALTH_CHECK: &str = "health";

/// Restart accounting for one pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRestarts {
    pub pod: String,
    pub restart_policy: String,
    pub restarts: u32,
    /// Member containers inspected (zero when the policy is `"no"`).
    pub containers: usize,
}

/// What a passing health check observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub application: String,
    pub rows: Vec<StatusRow>,
    pub restarts: Vec<PodRestarts>,
}

/// Verifies pod liveness and restart-freedom for one application.
pub struct HealthVerifier<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> HealthVerifier<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Run the health check under the context's health-check deadline.
    pub async fn verify(
        &self,
        ctx: &RunContext,
        topology: &ExpectedTopology,
    ) -> Result<CheckOutcome<HealthReport>, VerifyError> {
        obs::emit_check_started(HEALTH_CHECK, &ctx.application);
        let start = Instant::now();

        let outcome = tokio::time::timeout(ctx.timeouts.health_check(), self.check(ctx, topology))
            .await
            .map_err(|_| VerifyError::Timeout {
                check: HEALTH_CHECK,
                application: ctx.application.clone(),
                timeout_secs: ctx.timeouts.health_check_secs,
            })??;

        obs::emit_check_finished(
            HEALTH_CHECK,
            &ctx.application,
            outcome.label(),
            start.elapsed().as_millis() as u64,
        );
        Ok(outcome)
    }

    async fn check(
        &self,
        ctx: &RunContext,
        topology: &ExpectedTopology,
    ) -> Result<CheckOutcome<HealthReport>, VerifyError> {
        let Some(rows) = query_status_rows(self.executor, ctx).await? else {
            return Ok(CheckOutcome::not_applicable("no pods found"));
        };

        if let Some(row) = rows.iter().find(|row| !row.is_healthy()) {
            return Ok(CheckOutcome::Fail(AssertionFailure::UnhealthyPod {
                pod: row.pod_name.clone(),
                status: row.status.clone(),
            }));
        }

        let mut restarts = Vec::with_capacity(topology.suffixes().len());
        for pod in topology.pod_names(&ctx.application) {
            if !rows.iter().any(|row| row.pod_name == pod) {
                return Ok(CheckOutcome::Fail(AssertionFailure::MissingPod { pod }));
            }

            let accounting = self.total_restarts(ctx, &pod).await?;
            tracing::info!(pod = %pod, restarts = accounting.restarts, "Restart count");
            if accounting.restarts > 0 {
                return Ok(CheckOutcome::Fail(AssertionFailure::Restarted {
                    pod,
                    count: accounting.restarts,
                }));
            }
            restarts.push(accounting);
        }

        Ok(CheckOutcome::Pass(HealthReport {
            application: ctx.application.clone(),
            rows,
            restarts,
        }))
    }

    /// Total restarts across a pod's containers. A pod whose restart policy
    /// is `"no"` reports 0 without inspecting its containers.
    pub async fn total_restarts(
        &self,
        ctx: &RunContext,
        pod: &str,
    ) -> Result<PodRestarts, InspectionError> {
        let client = InspectionClient::new(self.executor, &ctx.tools, ctx.timeouts.command_secs);
        let inspection = client.inspect_pod(pod).await?;

        if inspection.never_restarts() {
            return Ok(PodRestarts {
                pod: pod.to_string(),
                restart_policy: inspection.restart_policy,
                restarts: 0,
                containers: 0,
            });
        }

        let mut restarts: u32 = 0;
        for container in &inspection.containers {
            let details = client.inspect_container(&container.id).await?;
            restarts = restarts.saturating_add(details.restart_count);
        }

        Ok(PodRestarts {
            pod: pod.to_string(),
            restart_policy: inspection.restart_policy,
            restarts,
            containers: inspection.containers.len(),
        })
    }
}
