//! Bounded retry combinator.
//!
//! Retrieval calls (transient failures) and judge calls (format repair) use
//! separate `RetryExecutor` instances with their own budgets. Attempts run
//! back to back with no backoff; every attempt is bounded by a shared
//! [`Deadline`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::obs;

/// Absolute point in time after which no further work may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now() + duration)
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left, or zero once expired.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }
}

/// Why a retried operation produced no value.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("attempt {attempt} failed with a non-retryable error: {error}")]
    Aborted { attempt: u32, error: E },

    #[error("deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: u32 },
}

impl<E> RetryError<E> {
    /// Attempts started before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Aborted { attempt, .. } => *attempt,
            RetryError::DeadlineExceeded { attempts } => *attempts,
        }
    }

    /// The error returned by the final attempt, if it completed.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Aborted { error, .. } => Some(error),
            RetryError::DeadlineExceeded { .. } => None,
        }
    }
}

/// Runs an async operation up to `max_attempts` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryExecutor {
    label: &'static str,
    max_attempts: u32,
}

impl RetryExecutor {
    /// A budget of 0 is treated as 1.
    pub fn new(label: &'static str, max_attempts: u32) -> Self {
        Self {
            label,
            max_attempts,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Retry every error until success, exhaustion or deadline.
    pub async fn run<T, E, F, Fut>(&self, deadline: Deadline, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(Deadline) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_if(deadline, op, |_| true).await
    }

    /// Like [`run`](Self::run), but stops with `Aborted` as soon as
    /// `retryable` rejects an error.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        deadline: Deadline,
        mut op: F,
        retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(Deadline) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            if deadline.is_expired() {
                return Err(RetryError::DeadlineExceeded { attempts: attempt });
            }
            attempt += 1;

            let error = match tokio::time::timeout_at(deadline.instant(), op(deadline)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) => error,
                Err(_) => return Err(RetryError::DeadlineExceeded { attempts: attempt }),
            };

            if !retryable(&error) {
                return Err(RetryError::Aborted { attempt, error });
            }

            obs::emit_retry_attempt_failed(self.label, attempt, max_attempts, &error);

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
        }
    }
}
