//! Configuration surface.
//!
//! Every setting has a default and can be overridden from the environment;
//! the CLI layers its own flags on top. Lookups go through a closure so tests
//! can supply a fixed environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{CheckError, Result};

pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.70;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_CASE_TIMEOUT_SECS: u64 = 240;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RAG_PORT: u16 = 5000;
pub const DEFAULT_JUDGE_PORT: u16 = 8011;

pub const ENV_ACCURACY_THRESHOLD: &str = "RAG_ACCURACY_THRESHOLD";
pub const ENV_MAX_RETRIES: &str = "RAG_MAX_RETRIES";
pub const ENV_JUDGE_MAX_RETRIES: &str = "RAG_JUDGE_MAX_RETRIES";
pub const ENV_CASE_TIMEOUT_SECS: &str = "RAG_CASE_TIMEOUT_SECS";
pub const ENV_HOST: &str = "APPCHECK_HOST";
pub const ENV_RAG_BASE_URL: &str = "RAG_BASE_URL";
pub const ENV_RAG_MODEL: &str = "RAG_MODEL";
pub const ENV_JUDGE_BASE_URL: &str = "LLM_JUDGE_BASE_URL";
pub const ENV_JUDGE_PORT: &str = "LLM_JUDGE_PORT";
pub const ENV_JUDGE_MODEL: &str = "LLM_JUDGE_MODEL";
pub const ENV_APP_CLI: &str = "APPCHECK_APP_CLI";
pub const ENV_PODMAN: &str = "APPCHECK_PODMAN";

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Golden-dataset evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Minimum accuracy (0.0–1.0) for the run to pass.
    pub accuracy_threshold: f64,
    /// Attempt budget for retrieval calls.
    pub max_retries: u32,
    /// Attempt budget for judge format repair.
    pub judge_max_retries: u32,
    /// Deadline for one case (retrieval + judge, retries included).
    pub case_timeout_secs: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
            judge_max_retries: DEFAULT_MAX_RETRIES,
            case_timeout_secs: DEFAULT_CASE_TIMEOUT_SECS,
        }
    }
}

impl EvalConfig {
    /// Read overrides from the process environment. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            accuracy_threshold: parse_or(lookup(ENV_ACCURACY_THRESHOLD), DEFAULT_ACCURACY_THRESHOLD),
            max_retries: parse_or(lookup(ENV_MAX_RETRIES), DEFAULT_MAX_RETRIES),
            judge_max_retries: parse_or(lookup(ENV_JUDGE_MAX_RETRIES), DEFAULT_MAX_RETRIES),
            case_timeout_secs: parse_or(lookup(ENV_CASE_TIMEOUT_SECS), DEFAULT_CASE_TIMEOUT_SECS),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.accuracy_threshold = threshold;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_judge_max_retries(mut self, max_retries: u32) -> Self {
        self.judge_max_retries = max_retries;
        self
    }

    pub fn with_case_timeout_secs(mut self, secs: u64) -> Self {
        self.case_timeout_secs = secs;
        self
    }

    pub fn case_timeout(&self) -> Duration {
        Duration::from_secs(self.case_timeout_secs)
    }

    /// Reject thresholds outside 0.0–1.0 and zero case timeouts.
    pub fn validate(&self) -> Result<()> {
        if !self.accuracy_threshold.is_finite() || !(0.0..=1.0).contains(&self.accuracy_threshold)
        {
            return Err(CheckError::Config(format!(
                "accuracy threshold must be within 0.0..=1.0, got {}",
                self.accuracy_threshold
            )));
        }
        if self.case_timeout_secs == 0 {
            return Err(CheckError::Config(
                "case timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Executables invoked by the deployment checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    /// Application CLI providing `application ps`.
    pub app_cli: String,
    /// Container tool providing `pod inspect`, `inspect` and `port`.
    pub podman: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::from_lookup(process_env)
    }
}

impl ToolPaths {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            app_cli: lookup(ENV_APP_CLI).unwrap_or_else(|| "ai-services".to_string()),
            podman: lookup(ENV_PODMAN).unwrap_or_else(|| "podman".to_string()),
        }
    }
}

/// Retrieval and judge service locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub rag_base_url: String,
    pub rag_model: Option<String>,
    pub judge_base_url: String,
    pub judge_model: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_lookup(process_env)
    }
}

impl Endpoints {
    /// Explicit base URLs win; otherwise URLs are derived from `APPCHECK_HOST`
    /// (default `localhost`) and the well-known ports.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST).unwrap_or_else(|| "localhost".to_string());
        let judge_port: u16 = parse_or(lookup(ENV_JUDGE_PORT), DEFAULT_JUDGE_PORT);

        Self {
            rag_base_url: lookup(ENV_RAG_BASE_URL)
                .unwrap_or_else(|| format!("http://{host}:{DEFAULT_RAG_PORT}")),
            rag_model: lookup(ENV_RAG_MODEL),
            judge_base_url: lookup(ENV_JUDGE_BASE_URL)
                .unwrap_or_else(|| format!("http://{host}:{judge_port}")),
            judge_model: lookup(ENV_JUDGE_MODEL),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Deadlines for subprocesses and whole checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub command_secs: u64,
    pub health_check_secs: u64,
    pub port_check_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            health_check_secs: DEFAULT_CHECK_TIMEOUT_SECS,
            port_check_secs: DEFAULT_CHECK_TIMEOUT_SECS,
        }
    }
}

impl Timeouts {
    pub fn health_check(&self) -> Duration {
        Duration::from_secs(self.health_check_secs)
    }

    pub fn port_check(&self) -> Duration {
        Duration::from_secs(self.port_check_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_eval_config_defaults() {
        let config = EvalConfig::from_lookup(env(&[]));
        assert_eq!(config.accuracy_threshold, 0.70);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.judge_max_retries, 2);
        assert_eq!(config.case_timeout_secs, 240);
    }

    #[test]
    fn test_eval_config_env_overrides() {
        let config = EvalConfig::from_lookup(env(&[
            ("RAG_ACCURACY_THRESHOLD", "0.85"),
            ("RAG_MAX_RETRIES", "4"),
            ("RAG_JUDGE_MAX_RETRIES", "3"),
        ]));
        assert_eq!(config.accuracy_threshold, 0.85);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.judge_max_retries, 3);
    }

    #[test]
    fn test_unparseable_threshold_falls_back_to_default() {
        let config = EvalConfig::from_lookup(env(&[("RAG_ACCURACY_THRESHOLD", "high")]));
        assert_eq!(config.accuracy_threshold, DEFAULT_ACCURACY_THRESHOLD);
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        assert!(EvalConfig::default().with_threshold(1.5).validate().is_err());
        assert!(EvalConfig::default().with_threshold(f64::NAN).validate().is_err());
        assert!(EvalConfig::default().with_threshold(1.0).validate().is_ok());
        assert!(EvalConfig::default().with_case_timeout_secs(0).validate().is_err());
    }

    #[test]
    fn test_endpoints_derive_from_host_and_judge_port() {
        let endpoints = Endpoints::from_lookup(env(&[
            ("APPCHECK_HOST", "10.0.0.5"),
            ("LLM_JUDGE_PORT", "9011"),
        ]));
        assert_eq!(endpoints.rag_base_url, "http://10.0.0.5:5000");
        assert_eq!(endpoints.judge_base_url, "http://10.0.0.5:9011");
        assert!(endpoints.judge_model.is_none());
    }

    #[test]
    fn test_explicit_base_urls_win() {
        let endpoints = Endpoints::from_lookup(env(&[
            ("RAG_BASE_URL", "http://rag:5100"),
            ("LLM_JUDGE_BASE_URL", "http://judge:8000"),
            ("LLM_JUDGE_PORT", "9011"),
        ]));
        assert_eq!(endpoints.rag_base_url, "http://rag:5100");
        assert_eq!(endpoints.judge_base_url, "http://judge:8000");
    }

    #[test]
    fn test_tool_paths_defaults_and_overrides() {
        let tools = ToolPaths::from_lookup(env(&[]));
        assert_eq!(tools.app_cli, "ai-services");
        assert_eq!(tools.podman, "podman");

        let tools = ToolPaths::from_lookup(env(&[("APPCHECK_PODMAN", "/usr/local/bin/podman")]));
        assert_eq!(tools.podman, "/usr/local/bin/podman");
    }
}
