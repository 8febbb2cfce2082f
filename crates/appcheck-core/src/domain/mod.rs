//! Domain models for appcheck.
//!
//! - `StatusRow`, `PodInspection`, `ContainerInspection`: deployment state
//! - `ExpectedTopology`: pods an application template must run
//! - `GoldenCase`, `EvalResult`, `AccuracySummary`: functional evaluation
//! - `CheckOutcome`: tri-state result of a deployment check

pub mod error;
pub mod eval;
pub mod outcome;
pub mod status;
pub mod topology;

// Re-export main types and errors
pub use error::{
    AssertionFailure, CheckError, DatasetError, InspectionError, ParseError, Result,
    ServiceError, VerifyError,
};
pub use eval::{AccuracySummary, EvalResult, GoldenCase, Judgement, Verdict};
pub use outcome::{CheckOutcome, OutcomeSummary};
pub use status::{ContainerInspection, PodContainer, PodInspection, StatusRow};
pub use topology::{pod_name, ExpectedTopology};
