//! Error taxonomy for deployment checks and golden-dataset evaluation.

use appcheck_exec::ExecError;
use std::path::PathBuf;

/// Malformed status table input. Fatal to the verification pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line_no}: unparseable row: {line:?}")]
    UnparseableRow { line_no: usize, line: String },

    #[error("line {line_no}: header after table rows: {line:?}")]
    UnexpectedHeader { line_no: usize, line: String },

    #[error("line {line_no}: duplicate pod {pod}")]
    DuplicatePod { line_no: usize, pod: String },
}

impl ParseError {
    /// 1-based line number of the offending input line.
    pub fn line_no(&self) -> usize {
        match self {
            ParseError::UnparseableRow { line_no, .. }
            | ParseError::UnexpectedHeader { line_no, .. }
            | ParseError::DuplicatePod { line_no, .. } => *line_no,
        }
    }
}

/// Failure to obtain or decode pod/container inspection data.
#[derive(Debug, thiserror::Error)]
pub enum InspectionError {
    #[error("failed to inspect {target}: {source}")]
    Command {
        target: String,
        #[source]
        source: ExecError,
    },

    #[error("empty inspect output for {target}")]
    EmptyOutput { target: String },

    #[error("failed to parse inspect output for {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no inspect data for {target}")]
    NoRecords { target: String },
}

/// A deployment expectation that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssertionFailure {
    #[error("pod {pod} is not healthy (status={status})")]
    UnhealthyPod { pod: String, status: String },

    #[error("expected pod {pod} to exist")]
    MissingPod { pod: String },

    #[error("pod {pod} restarted {count} times")]
    Restarted { pod: String, count: u32 },

    #[error("expected host port {port} not found on any container for app {application}")]
    MissingPort { port: u16, application: String },
}

/// Errors that abort a health or port verification pass.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("status query for application {application} failed: {source}")]
    StatusQuery {
        application: String,
        #[source]
        source: ExecError,
    },

    #[error("failed to parse pod rows: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Inspection(#[from] InspectionError),

    #[error("{check} check for {application} timed out after {timeout_secs} seconds")]
    Timeout {
        check: &'static str,
        application: String,
        timeout_secs: u64,
    },
}

/// Errors from the retrieval and judge HTTP services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("malformed judge output: {0}")]
    MalformedOutput(String),
}

/// Golden dataset loading failures.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read golden dataset {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV in {path:?}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("golden dataset {path:?} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("golden dataset {path:?} row {row}: {message}")]
    InvalidCase {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("golden dataset {path:?} is empty")]
    Empty { path: PathBuf },
}

/// Top-level error for appcheck operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("no golden cases to evaluate; accuracy is undefined")]
    EmptyDataset,

    #[error("RAG accuracy {accuracy:.2} below threshold {threshold:.2}")]
    ThresholdFailure { accuracy: f64, threshold: f64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for appcheck operations.
pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_line() {
        let err = ParseError::UnparseableRow {
            line_no: 3,
            line: "garbage".to_string(),
        };
        assert_eq!(err.line_no(), 3);
        assert!(err.to_string().contains("garbage"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_assertion_failure_messages_name_subject() {
        let err = AssertionFailure::MissingPod {
            pod: "demo--ui".to_string(),
        };
        assert!(err.to_string().contains("demo--ui"));

        let err = AssertionFailure::MissingPort {
            port: 3000,
            application: "demo".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3000"));
        assert!(msg.contains("demo"));
    }

    #[test]
    fn test_threshold_failure_names_both_values() {
        let err = CheckError::ThresholdFailure {
            accuracy: 0.6,
            threshold: 0.7,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.60"));
        assert!(msg.contains("0.70"));
    }

    #[test]
    fn test_verify_error_wraps_parse_error() {
        let err: VerifyError = ParseError::DuplicatePod {
            line_no: 4,
            pod: "demo--db".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("failed to parse pod rows"));
    }
}
