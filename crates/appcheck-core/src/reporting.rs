use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::EvaluationReport;
use crate::domain::{CheckOutcome, EvalResult, OutcomeSummary};
use crate::golden::GoldenDataset;
use crate::health::HealthReport;
use crate::ports::PortReport;

pub const SCHEMA_VERSION: &str = "1.0";
pub const EVAL_RESULTS_FILE: &str = "eval_results.json";
pub const HEALTH_REPORT_FILE: &str = "health_report.json";

/// Summary section persisted in eval_results.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalSummaryArtifact {
    pub total_cases: usize,
    pub passed_cases: usize,
    pub accuracy: f64,
    pub threshold: f64,
    pub overall_pass: bool,
}

/// Per-run golden evaluation artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalResultsArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub dataset_path: String,
    pub dataset_digest: String,
    pub summary: EvalSummaryArtifact,
    pub case_results: Vec<EvalResult>,
}

impl EvalResultsArtifact {
    pub fn new(run_id: &str, dataset: &GoldenDataset, report: &EvaluationReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_id: run_id.to_string(),
            dataset_path: dataset.path.display().to_string(),
            dataset_digest: dataset.digest.clone(),
            summary: EvalSummaryArtifact {
                total_cases: report.summary.total_count,
                passed_cases: report.summary.passed_count,
                accuracy: report.summary.accuracy,
                threshold: report.summary.threshold,
                overall_pass: report.passed(),
            },
            case_results: report.results.clone(),
        }
    }
}

/// One check's outcome in health_report.json.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckArtifact<R> {
    pub check: String,
    #[serde(flatten)]
    pub outcome: OutcomeSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<R>,
}

impl<R: Clone> CheckArtifact<R> {
    pub fn from_outcome(check: &str, outcome: &CheckOutcome<R>) -> Self {
        Self {
            check: check.to_string(),
            outcome: OutcomeSummary::from(outcome),
            report: outcome.report().cloned(),
        }
    }
}

/// Per-run deployment verification artifact.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub application: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<CheckArtifact<HealthReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<CheckArtifact<PortReport>>,
}

impl HealthReportArtifact {
    pub fn new(run_id: &str, application: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_id: run_id.to_string(),
            application: application.to_string(),
            health: None,
            ports: None,
        }
    }
}

fn run_dir(dir: &Path, run_id: &str) -> Result<PathBuf> {
    let run_dir = dir.join(run_id);
    std::fs::create_dir_all(&run_dir).with_context(|| format!("create {:?}", run_dir))?;
    Ok(run_dir)
}

/// Write `<dir>/<run_id>/eval_results.json` in pretty JSON format.
pub fn write_eval_results_json(dir: &Path, artifact: &EvalResultsArtifact) -> Result<PathBuf> {
    let path = run_dir(dir, &artifact.run_id)?.join(EVAL_RESULTS_FILE);
    let content = serde_json::to_string_pretty(artifact).context("serialize eval artifact")?;
    std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
    Ok(path)
}

/// Write `<dir>/<run_id>/health_report.json` in pretty JSON format.
pub fn write_health_report_json(dir: &Path, artifact: &HealthReportArtifact) -> Result<PathBuf> {
    let path = run_dir(dir, &artifact.run_id)?.join(HEALTH_REPORT_FILE);
    let content = serde_json::to_string_pretty(artifact).context("serialize health artifact")?;
    std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccuracySummary;
    use serde_json::json;

    fn eval_artifact() -> EvalResultsArtifact {
        EvalResultsArtifact {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("parse RFC3339")
                .with_timezone(&Utc),
            run_id: "run-1".to_string(),
            dataset_path: "golden.csv".to_string(),
            dataset_digest: "abc".to_string(),
            summary: EvalSummaryArtifact {
                total_cases: 2,
                passed_cases: 1,
                accuracy: 0.5,
                threshold: 0.7,
                overall_pass: false,
            },
            case_results: vec![EvalResult {
                question: "q".to_string(),
                passed: true,
                details: "verdict=YES reason=ok".to_string(),
            }],
        }
    }

    #[test]
    fn eval_results_schema_has_expected_keys() {
        let value = serde_json::to_value(eval_artifact()).expect("serialize");
        for key in [
            "schema_version",
            "generated_at",
            "run_id",
            "dataset_path",
            "dataset_digest",
            "summary",
            "case_results",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["summary"]["overall_pass"], json!(false));
    }

    #[test]
    fn eval_artifact_from_report_copies_summary() {
        let dataset = GoldenDataset {
            path: PathBuf::from("golden.csv"),
            digest: "d1".to_string(),
            cases: vec![],
        };
        let report = EvaluationReport {
            results: vec![],
            summary: AccuracySummary::compute(7, 10, 0.7).expect("non-empty"),
        };
        let artifact = EvalResultsArtifact::new("run-2", &dataset, &report);
        assert_eq!(artifact.summary.passed_cases, 7);
        assert!(artifact.summary.overall_pass);
        assert_eq!(artifact.dataset_digest, "d1");
    }

    #[test]
    fn health_artifact_flattens_outcome() {
        let mut artifact = HealthReportArtifact::new("run-3", "demo");
        let skipped: CheckOutcome<HealthReport> = CheckOutcome::not_applicable("no pods found");
        artifact.health = Some(CheckArtifact::from_outcome("health", &skipped));
        let value = serde_json::to_value(&artifact).expect("serialize");
        assert_eq!(value["health"]["outcome"], json!("not_applicable"));
        assert_eq!(value["health"]["detail"], json!("no pods found"));
        assert!(value.get("ports").is_none());
    }
}
