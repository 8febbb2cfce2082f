//! Structured observability hooks for verification and evaluation runs.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for check lifecycle, per-case verdicts and retries
//!
//! Events carry an `event = "..."` field so they can be filtered in JSON
//! output. Verbosity follows `RUST_LOG`.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("run-12345");
/// // Every event emitted while the guard lives carries run_id = "run-12345"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("appcheck.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a health or port check started.
pub fn emit_check_started(check: &str, application: &str) {
    info!(event = "check.started", check = %check, application = %application);
}

/// Emit event: a check finished with outcome `pass`, `fail` or `not_applicable`.
pub fn emit_check_finished(check: &str, application: &str, outcome: &str, duration_ms: u64) {
    info!(
        event = "check.finished",
        check = %check,
        application = %application,
        outcome = %outcome,
        duration_ms = duration_ms,
    );
}

/// Emit event: one golden case evaluated.
pub fn emit_case_evaluated(index: usize, passed: bool, details: &str) {
    info!(
        event = "eval.case_evaluated",
        index = index,
        passed = passed,
        details = %details,
    );
}

/// Emit event: evaluation summary with accuracy against threshold.
pub fn emit_eval_summary(passed: usize, total: usize, accuracy: f64, threshold: f64) {
    info!(
        event = "eval.summary",
        passed = passed,
        total = total,
        accuracy = accuracy,
        threshold = threshold,
        meets_threshold = accuracy >= threshold,
    );
}

/// Emit event: a retried operation failed one attempt.
pub fn emit_retry_attempt_failed(label: &str, attempt: u32, max_attempts: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "retry.attempt_failed",
        label = %label,
        attempt = attempt,
        max_attempts = max_attempts,
        error = %error,
    );
}

/// Emit event: a container's port query failed and the container was skipped.
pub fn emit_container_port_skipped(container_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "ports.container_skipped", container_id = %container_id, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("test-run-id");
    }
}
