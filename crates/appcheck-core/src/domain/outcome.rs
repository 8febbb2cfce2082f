//! Tri-state outcome of a deployment check.

use serde::Serialize;

use crate::domain::error::AssertionFailure;

/// Outcome of a health or port check.
///
/// `NotApplicable` is only produced when the status table is empty (nothing
/// deployed yet). A deployed-but-broken application is always `Fail`.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome<R> {
    NotApplicable { reason: String },
    Pass(R),
    Fail(AssertionFailure),
}

impl<R> CheckOutcome<R> {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        CheckOutcome::NotApplicable {
            reason: reason.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, CheckOutcome::Fail(_))
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, CheckOutcome::NotApplicable { .. })
    }

    pub fn failure(&self) -> Option<&AssertionFailure> {
        match self {
            CheckOutcome::Fail(f) => Some(f),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&R> {
        match self {
            CheckOutcome::Pass(r) => Some(r),
            _ => None,
        }
    }

    /// Short label used in logs and artifacts.
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::NotApplicable { .. } => "not_applicable",
            CheckOutcome::Pass(_) => "pass",
            CheckOutcome::Fail(_) => "fail",
        }
    }

    /// Collapse into a `Result`: `Fail` becomes the error, `NotApplicable` becomes `Ok(None)`.
    pub fn into_result(self) -> Result<Option<R>, AssertionFailure> {
        match self {
            CheckOutcome::NotApplicable { .. } => Ok(None),
            CheckOutcome::Pass(r) => Ok(Some(r)),
            CheckOutcome::Fail(f) => Err(f),
        }
    }
}

/// Serializable view of an outcome without its report payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<R> From<&CheckOutcome<R>> for OutcomeSummary {
    fn from(outcome: &CheckOutcome<R>) -> Self {
        let detail = match outcome {
            CheckOutcome::NotApplicable { reason } => Some(reason.clone()),
            CheckOutcome::Pass(_) => None,
            CheckOutcome::Fail(f) => Some(f.to_string()),
        };
        Self {
            outcome: outcome.label(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_keeps_three_states_distinct() {
        let skipped: CheckOutcome<u32> = CheckOutcome::not_applicable("no pods found");
        assert!(skipped.is_not_applicable());
        assert_eq!(skipped.into_result(), Ok(None));

        let passed = CheckOutcome::Pass(7u32);
        assert_eq!(passed.into_result(), Ok(Some(7)));

        let failed: CheckOutcome<u32> = CheckOutcome::Fail(AssertionFailure::MissingPod {
            pod: "demo--ui".to_string(),
        });
        assert!(failed.is_fail());
        assert!(failed.into_result().is_err());
    }

    #[test]
    fn test_outcome_summary_carries_failure_message() {
        let failed: CheckOutcome<()> = CheckOutcome::Fail(AssertionFailure::Restarted {
            pod: "demo--db".to_string(),
            count: 2,
        });
        let summary = OutcomeSummary::from(&failed);
        assert_eq!(summary.outcome, "fail");
        assert_eq!(summary.detail.as_deref(), Some("pod demo--db restarted 2 times"));
    }
}
