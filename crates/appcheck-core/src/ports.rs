//! Host port exposure verification.

use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::Instant;

use appcheck_exec::CommandExecutor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::RunContext;
use crate::domain::{AssertionFailure, CheckOutcome, InspectionError, VerifyError};
use crate::inspection::InspectionClient;
use crate::obs;
use crate::status_table::query_status_rows;

pub const PORT_CHECK: &str = "ports";

struct PortPatterns {
    host_binding: Regex,
    arrow_mapping: Regex,
    any_integer: Regex,
}

fn patterns() -> &'static PortPatterns {
    static PATTERNS: OnceLock<PortPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PortPatterns {
        host_binding: Regex::new(r"\b\d+\.\d+\.\d+\.\d+:(?P<port>\d+)\b").expect("static regex"),
        arrow_mapping: Regex::new(r"->\s*(?P<port>\d+)/(tcp|udp)").expect("static regex"),
        any_integer: Regex::new(r"(?P<port>\d+)").expect("static regex"),
    })
}

fn capture_port(re: &Regex, line: &str) -> Option<u16> {
    re.captures(line)?.name("port")?.as_str().parse().ok()
}

/// Host port from one line of `port` output.
///
/// Tried in order: `<ipv4>:<port>`, then `-> <port>/tcp|udp`, then the first
/// integer anywhere on the line. The last tier accepts any number and can
/// pick up a container port.
pub fn extract_port(line: &str) -> Option<u16> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let p = patterns();
    capture_port(&p.host_binding, line)
        .or_else(|| capture_port(&p.arrow_mapping, line))
        .or_else(|| capture_port(&p.any_integer, line))
}

/// Every host port found in a block of `port` output, in line order.
pub fn extract_host_ports(output: &str) -> Vec<u16> {
    output.lines().filter_map(extract_port).collect()
}

/// What a port check observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortReport {
    pub application: String,
    pub found: BTreeSet<u16>,
    pub containers_scanned: usize,
    /// Containers whose port query failed.
    pub skipped_containers: Vec<String>,
}

/// Verifies that expected host ports are bound by some container of the application.
pub struct PortVerifier<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> PortVerifier<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Run the port check under the context's port-check deadline.
    pub async fn verify(
        &self,
        ctx: &RunContext,
        expected_ports: &[u16],
    ) -> Result<CheckOutcome<PortReport>, VerifyError> {
        obs::emit_check_started(PORT_CHECK, &ctx.application);
        let start = Instant::now();

        let outcome = tokio::time::timeout(ctx.timeouts.port_check(), self.check(ctx, expected_ports))
            .await
            .map_err(|_| VerifyError::Timeout {
                check: PORT_CHECK,
                application: ctx.application.clone(),
                timeout_secs: ctx.timeouts.port_check_secs,
            })??;

        obs::emit_check_finished(
            PORT_CHECK,
            &ctx.application,
            outcome.label(),
            start.elapsed().as_millis() as u64,
        );
        Ok(outcome)
    }

    async fn check(
        &self,
        ctx: &RunContext,
        expected_ports: &[u16],
    ) -> Result<CheckOutcome<PortReport>, VerifyError> {
        let Some(rows) = query_status_rows(self.executor, ctx).await? else {
            return Ok(CheckOutcome::not_applicable("no pods found"));
        };

        let client = InspectionClient::new(self.executor, &ctx.tools, ctx.timeouts.command_secs);
        let mut report = PortReport {
            application: ctx.application.clone(),
            found: BTreeSet::new(),
            containers_scanned: 0,
            skipped_containers: Vec::new(),
        };

        for row in &rows {
            let pod = match client.inspect_pod(&row.pod_name).await {
                Ok(pod) => pod,
                Err(InspectionError::NoRecords { .. }) => {
                    debug!(pod = %row.pod_name, "No inspect data, skipping pod");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            for container in &pod.containers {
                report.containers_scanned += 1;
                match client.container_ports(&container.id).await {
                    Ok(output) => report.found.extend(extract_host_ports(&output)),
                    Err(err) => {
                        obs::emit_container_port_skipped(&container.id, &err);
                        report.skipped_containers.push(container.id.clone());
                    }
                }
            }
        }

        debug!(application = %ctx.application, found = ?report.found, "Discovered host ports");

        if let Some(&port) = expected_ports.iter().find(|p| !report.found.contains(*p)) {
            return Ok(CheckOutcome::Fail(AssertionFailure::MissingPort {
                port,
                application: ctx.application.clone(),
            }));
        }

        Ok(CheckOutcome::Pass(report))
    }
}
