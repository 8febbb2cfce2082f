//! Golden-dataset aggregation and the accuracy gate.

use std::fmt::Write as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{AccuracySummary, CheckError, EvalResult, GoldenCase, Result};
use crate::evaluator::{AnswerEvaluator, EvalFailure};
use crate::obs;
use crate::retry::Deadline;

/// Results of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub results: Vec<EvalResult>,
    pub summary: AccuracySummary,
}

impl EvaluationReport {
    /// Whether accuracy meets the threshold (equal passes).
    pub fn passed(&self) -> bool {
        self.summary.meets_threshold()
    }

    /// Fail with both values when accuracy is below the threshold.
    pub fn ensure_threshold(&self) -> Result<()> {
        if self.passed() {
            Ok(())
        } else {
            Err(CheckError::ThresholdFailure {
                accuracy: self.summary.accuracy,
                threshold: self.summary.threshold,
            })
        }
    }

    /// Human-readable per-case verdicts followed by the aggregate line.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str("RAG validation summary\n");
        for (idx, result) in self.results.iter().enumerate() {
            let mark = if result.passed { "PASS" } else { "FAIL" };
            let _ = writeln!(out, "  [{:>3}] {mark}  {}", idx + 1, result.question);
            let _ = writeln!(out, "        {}", result.details);
        }
        let _ = writeln!(
            out,
            "Accuracy: {}/{} = {:.2} (threshold {:.2}) {}",
            self.summary.passed_count,
            self.summary.total_count,
            self.summary.accuracy,
            self.summary.threshold,
            if self.passed() { "PASS" } else { "FAIL" }
        );
        out
    }
}

/// Runs every golden case through an [`AnswerEvaluator`], sequentially.
pub struct EvaluationAggregator {
    evaluator: AnswerEvaluator,
    case_timeout: Duration,
}

impl EvaluationAggregator {
    pub fn new(evaluator: AnswerEvaluator, case_timeout: Duration) -> Self {
        Self {
            evaluator,
            case_timeout,
        }
    }

    /// Evaluate `cases` and compute accuracy against `threshold`.
    ///
    /// A case that fails to evaluate is recorded as not passed and the run
    /// continues. An empty dataset is rejected before any work.
    pub async fn run(&self, cases: &[GoldenCase], threshold: f64) -> Result<EvaluationReport> {
        if cases.is_empty() {
            return Err(CheckError::EmptyDataset);
        }

        let mut results = Vec::with_capacity(cases.len());
        let mut passed_count = 0;

        for (idx, case) in cases.iter().enumerate() {
            let deadline = Deadline::after(self.case_timeout);
            let outcome = tokio::time::timeout_at(
                deadline.instant(),
                self.evaluator
                    .evaluate(deadline, &case.question, &case.golden_answer),
            )
            .await
            .unwrap_or(Err(EvalFailure::Timeout {
                timeout_secs: self.case_timeout.as_secs(),
            }));

            let result = match outcome {
                Ok(judgement) => {
                    let passed = judgement.verdict.passed();
                    if passed {
                        passed_count += 1;
                    }
                    EvalResult {
                        question: case.question.clone(),
                        passed,
                        details: format!(
                            "verdict={} reason={}",
                            judgement.verdict, judgement.reason
                        ),
                    }
                }
                Err(failure) => {
                    info!(stage = failure.stage(), error = %failure, "Case evaluation failed");
                    EvalResult {
                        question: case.question.clone(),
                        passed: false,
                        details: failure.to_string(),
                    }
                }
            };

            obs::emit_case_evaluated(idx, result.passed, &result.details);
            results.push(result);
        }

        let summary = AccuracySummary::compute(passed_count, results.len(), threshold)
            .ok_or(CheckError::EmptyDataset)?;
        obs::emit_eval_summary(
            summary.passed_count,
            summary.total_count,
            summary.accuracy,
            summary.threshold,
        );

        Ok(EvaluationReport { results, summary })
    }
}
