//! In-memory retrieval and judge services (testing only)
//!
//! Provides `ScriptedRetrieval`, `ScriptedJudge` and `RuleJudge`, which
//! satisfy the service traits without any network access and record how
//! often they were called.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ServiceError;
use crate::judge::{JudgeRequest, JudgeService, RawJudgement};
use crate::retrieval::RetrievalService;

fn unscripted(service: &str) -> ServiceError {
    ServiceError::Transport {
        url: format!("scripted://{service}"),
        message: "no scripted response".to_string(),
    }
}

// ---------------------------------------------------------------------------
// ScriptedRetrieval
// ---------------------------------------------------------------------------

/// Retrieval fake with per-question response queues and a fallback.
#[derive(Debug, Default)]
pub struct ScriptedRetrieval {
    queues: Mutex<HashMap<String, VecDeque<Result<String, ServiceError>>>>,
    fallback: Option<Result<String, ServiceError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRetrieval {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unscripted question with `answer`.
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            fallback: Some(Ok(answer.into())),
            ..Self::default()
        }
    }

    /// Fail every unscripted question with `error`.
    pub fn failing(error: ServiceError) -> Self {
        Self {
            fallback: Some(Err(error)),
            ..Self::default()
        }
    }

    /// Queue a response for `question`; queued responses are used in order.
    pub fn push(self, question: impl Into<String>, response: Result<String, ServiceError>) -> Self {
        self.queues
            .lock()
            .unwrap()
            .entry(question.into())
            .or_default()
            .push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, question: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.as_str() == question)
            .count()
    }
}

#[async_trait]
impl RetrievalService for ScriptedRetrieval {
    async fn ask(&self, question: &str) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(question.to_string());
        let queued = self
            .queues
            .lock()
            .unwrap()
            .get_mut(question)
            .and_then(VecDeque::pop_front);
        queued
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Err(unscripted("retrieval")))
    }
}

// ---------------------------------------------------------------------------
// ScriptedJudge
// ---------------------------------------------------------------------------

/// Judge fake returning queued responses in call order, then a fallback.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    queue: Mutex<VecDeque<Result<RawJudgement, ServiceError>>>,
    fallback: Option<Result<RawJudgement, ServiceError>>,
    candidates: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `verdict` for every call once the queue is drained.
    pub fn always(verdict: &str) -> Self {
        Self {
            fallback: Some(Ok(RawJudgement::new(verdict, "scripted"))),
            ..Self::default()
        }
    }

    pub fn then_verdict(self, verdict: &str, reason: &str) -> Self {
        self.then(Ok(RawJudgement::new(verdict, reason)))
    }

    pub fn then(self, response: Result<RawJudgement, ServiceError>) -> Self {
        self.queue.lock().unwrap().push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.candidates.lock().unwrap().len()
    }

    /// Candidate answers the judge was asked about, in order.
    pub fn candidates(&self) -> Vec<String> {
        self.candidates.lock().unwrap().clone()
    }
}

#[async_trait]
impl JudgeService for ScriptedJudge {
    async fn judge(&self, request: &JudgeRequest<'_>) -> Result<RawJudgement, ServiceError> {
        self.candidates
            .lock()
            .unwrap()
            .push(request.candidate_answer.to_string());
        let queued = self.queue.lock().unwrap().pop_front();
        queued
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Err(unscripted("judge")))
    }
}

// ---------------------------------------------------------------------------
// RuleJudge
// ---------------------------------------------------------------------------

type Rule = Box<dyn Fn(&JudgeRequest<'_>) -> RawJudgement + Send + Sync>;

/// Judge fake that decides each request with a closure.
pub struct RuleJudge {
    rule: Rule,
    calls: Mutex<usize>,
}

impl RuleJudge {
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&JudgeRequest<'_>) -> RawJudgement + Send + Sync + 'static,
    {
        Self {
            rule: Box::new(rule),
            calls: Mutex::new(0),
        }
    }

    /// `YES` when the candidate equals the golden answer, else `NO`.
    pub fn exact_match() -> Self {
        Self::new(|request| {
            if request.candidate_answer.trim() == request.golden_answer.trim() {
                RawJudgement::new("YES", "answers match")
            } else {
                RawJudgement::new("NO", "answers differ")
            }
        })
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl JudgeService for RuleJudge {
    async fn judge(&self, request: &JudgeRequest<'_>) -> Result<RawJudgement, ServiceError> {
        *self.calls.lock().unwrap() += 1;
        Ok((self.rule)(request))
    }
}
