//! appcheck core library
//!
//! Deployment health and port verification plus golden-dataset answer
//! evaluation for containerised retrieval-augmented applications.

pub mod aggregate;
pub mod chat;
pub mod commands;
pub mod config;
pub mod context;
pub mod domain;
pub mod evaluator;
pub mod fakes;
pub mod golden;
pub mod health;
pub mod inspection;
pub mod judge;
pub mod obs;
pub mod ports;
pub mod reporting;
pub mod retrieval;
pub mod retry;
pub mod status_table;
pub mod telemetry;

pub use domain::{
    pod_name, AccuracySummary, AssertionFailure, CheckError, CheckOutcome, ContainerInspection,
    DatasetError, EvalResult, ExpectedTopology, GoldenCase, InspectionError, Judgement,
    OutcomeSummary, ParseError, PodContainer, PodInspection, Result, ServiceError, StatusRow,
    Verdict, VerifyError,
};

pub use aggregate::{EvaluationAggregator, EvaluationReport};
pub use chat::{ChatClient, ChatMessage};
pub use commands::OrchestratorCommand;
pub use config::{EvalConfig, Endpoints, Timeouts, ToolPaths};
pub use context::RunContext;
pub use evaluator::{AnswerEvaluator, EvalFailure, JudgeAttemptError};
pub use golden::{load_golden, GoldenDataset};
pub use health::{HealthReport, HealthVerifier, PodRestarts, HEALTH_CHECK};
pub use inspection::InspectionClient;
pub use judge::{JudgeRequest, JudgeService, LlmJudgeClient, RawJudgement};
pub use obs::{
    emit_case_evaluated, emit_check_finished, emit_check_started, emit_eval_summary,
    emit_retry_attempt_failed, RunSpan,
};
pub use ports::{extract_host_ports, extract_port, PortReport, PortVerifier, PORT_CHECK};
pub use reporting::{
    write_eval_results_json, write_health_report_json, CheckArtifact, EvalResultsArtifact,
    HealthReportArtifact,
};
pub use retrieval::{RagClient, RetrievalService};
pub use retry::{Deadline, RetryError, RetryExecutor};
pub use status_table::{query_status_rows, StatusTableParser};
pub use telemetry::{init_tracing, LogFormat};

pub use appcheck_exec::{CommandExecutor, CommandSpec, ScriptedExecutor, SystemExecutor};
