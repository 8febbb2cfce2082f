//! Run context shared by every check in one process.
//!
//! Created once (usually in `main`) and passed by reference into each
//! verifier and evaluator call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Endpoints, Timeouts, ToolPaths};

pub const DEFAULT_TEMPLATE: &str = "rag";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Identifier stamped on logs and artifacts.
    pub run_id: String,
    /// Deployed application under test.
    pub application: String,
    /// Template the application was created from.
    pub template: String,
    pub tools: ToolPaths,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
}

impl RunContext {
    /// Context with a fresh run id and environment-derived defaults.
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            application: application.into(),
            template: DEFAULT_TEMPLATE.to_string(),
            tools: ToolPaths::default(),
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_unique_run_id() {
        let a = RunContext::new("demo");
        let b = RunContext::new("demo");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.template, "rag");
    }

    #[test]
    fn test_builder_overrides() {
        let ctx = RunContext::new("demo")
            .with_run_id("run-1")
            .with_template("summarize")
            .with_tools(ToolPaths {
                app_cli: "cli".to_string(),
                podman: "pm".to_string(),
            });
        assert_eq!(ctx.run_id, "run-1");
        assert_eq!(ctx.template, "summarize");
        assert_eq!(ctx.tools.podman, "pm");
    }
}
