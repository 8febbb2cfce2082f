//! Single-case answer evaluation: retrieval, then judgement.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::config::EvalConfig;
use crate::domain::{Judgement, ServiceError, Verdict};
use crate::judge::{JudgeRequest, JudgeService};
use crate::retrieval::RetrievalService;
use crate::retry::{Deadline, RetryError, RetryExecutor};

/// Why one judge attempt did not yield a usable verdict.
#[derive(Debug, thiserror::Error)]
pub enum JudgeAttemptError {
    #[error("judge returned invalid verdict {token:?}")]
    InvalidVerdict { token: String },

    #[error("unreadable judge output: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Service(ServiceError),
}

impl JudgeAttemptError {
    /// Format violations are retried; service failures are not.
    pub fn is_format_violation(&self) -> bool {
        !matches!(self, JudgeAttemptError::Service(_))
    }
}

impl From<ServiceError> for JudgeAttemptError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MalformedOutput(message) => JudgeAttemptError::Unreadable(message),
            other => JudgeAttemptError::Service(other),
        }
    }
}

/// Why a case could not be judged.
#[derive(Debug, thiserror::Error)]
pub enum EvalFailure {
    #[error("RAG request failed: {0}")]
    Retrieval(RetryError<ServiceError>),

    #[error("Judge failed: {0}")]
    Judge(RetryError<JudgeAttemptError>),

    #[error("case timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl EvalFailure {
    pub fn stage(&self) -> &'static str {
        match self {
            EvalFailure::Retrieval(_) => "retrieval",
            EvalFailure::Judge(_) => "judge",
            EvalFailure::Timeout { .. } => "timeout",
        }
    }
}

/// Asks the retrieval service a question and has the judge grade the answer.
pub struct AnswerEvaluator {
    retrieval: Arc<dyn RetrievalService>,
    judge: Arc<dyn JudgeService>,
    retrieval_retry: RetryExecutor,
    judge_retry: RetryExecutor,
}

impl AnswerEvaluator {
    pub fn new(
        retrieval: Arc<dyn RetrievalService>,
        judge: Arc<dyn JudgeService>,
        config: &EvalConfig,
    ) -> Self {
        Self {
            retrieval,
            judge,
            retrieval_retry: RetryExecutor::new("rag.ask", config.max_retries),
            judge_retry: RetryExecutor::new("judge.format", config.judge_max_retries),
        }
    }

    /// Evaluate one case before `deadline`.
    ///
    /// The judge is only called once retrieval has produced an answer.
    pub async fn evaluate(
        &self,
        deadline: Deadline,
        question: &str,
        golden_answer: &str,
    ) -> Result<Judgement, EvalFailure> {
        let retrieval: &dyn RetrievalService = self.retrieval.as_ref();
        let candidate_answer = self
            .retrieval_retry
            .run(deadline, move |_| retrieval.ask(question))
            .await
            .map_err(EvalFailure::Retrieval)?;

        let judge: &dyn JudgeService = self.judge.as_ref();
        let request = JudgeRequest {
            question,
            candidate_answer: &candidate_answer,
            golden_answer,
        };
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let (verdict, reason) = self
            .judge_retry
            .run_if(
                deadline,
                move |_| async move {
                    calls_ref.fetch_add(1, Ordering::SeqCst);
                    let raw = judge.judge(&request).await?;
                    let verdict = Verdict::parse(&raw.verdict).ok_or_else(|| {
                        JudgeAttemptError::InvalidVerdict {
                            token: raw.verdict.clone(),
                        }
                    })?;
                    Ok::<_, JudgeAttemptError>((verdict, raw.reason))
                },
                JudgeAttemptError::is_format_violation,
            )
            .await
            .map_err(EvalFailure::Judge)?;

        Ok(Judgement {
            verdict,
            reason,
            candidate_answer,
            judge_attempts: calls.load(Ordering::SeqCst),
        })
    }
}
