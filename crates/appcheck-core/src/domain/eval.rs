//! Golden-dataset evaluation types.

use serde::{Deserialize, Serialize};

/// One question/reference-answer pair from the golden dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenCase {
    pub question: String,
    #[serde(alias = "goldenAnswer", alias = "golden")]
    pub golden_answer: String,
}

impl GoldenCase {
    pub fn new(question: impl Into<String>, golden_answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            golden_answer: golden_answer.into(),
        }
    }
}

/// Binary judge verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Yes,
    No,
}

impl Verdict {
    /// Parse a verdict token. Only `YES` and `NO` are accepted; surrounding
    /// whitespace is ignored, case is not.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "YES" => Some(Verdict::Yes),
            "NO" => Some(Verdict::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "YES",
            Verdict::No => "NO",
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Yes)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A correctly formatted judge decision for one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub verdict: Verdict,
    pub reason: String,
    /// Answer returned by the retrieval service.
    pub candidate_answer: String,
    /// Judge calls made, including format retries.
    pub judge_attempts: u32,
}

/// Per-case outcome recorded by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResult {
    pub question: String,
    pub passed: bool,
    pub details: String,
}

/// Aggregate accuracy of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub passed_count: usize,
    pub total_count: usize,
    pub accuracy: f64,
    pub threshold: f64,
}

impl AccuracySummary {
    /// Compute the summary. Returns `None` when `total_count` is zero.
    pub fn compute(passed_count: usize, total_count: usize, threshold: f64) -> Option<Self> {
        if total_count == 0 {
            return None;
        }
        Some(Self {
            passed_count,
            total_count,
            accuracy: passed_count as f64 / total_count as f64,
            threshold,
        })
    }

    /// Accuracy equal to the threshold passes.
    pub fn meets_threshold(&self) -> bool {
        self.accuracy >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parse_is_strict() {
        assert_eq!(Verdict::parse("YES"), Some(Verdict::Yes));
        assert_eq!(Verdict::parse(" NO\n"), Some(Verdict::No));
        assert_eq!(Verdict::parse("yes"), None);
        assert_eq!(Verdict::parse("MAYBE"), None);
        assert_eq!(Verdict::parse("YES."), None);
        assert_eq!(Verdict::parse(""), None);
    }

    #[test]
    fn test_accuracy_undefined_without_cases() {
        assert!(AccuracySummary::compute(0, 0, 0.7).is_none());
    }

    #[test]
    fn test_accuracy_equal_to_threshold_passes() {
        let summary = AccuracySummary::compute(7, 10, 0.70).expect("defined");
        assert_eq!(summary.accuracy, 0.7);
        assert!(summary.meets_threshold());
    }

    #[test]
    fn test_accuracy_below_threshold_fails() {
        let summary = AccuracySummary::compute(6, 10, 0.70).expect("defined");
        assert!(!summary.meets_threshold());
    }

    #[test]
    fn test_golden_case_accepts_camel_case_key() {
        let case: GoldenCase =
            serde_json::from_str(r#"{"question":"q","goldenAnswer":"a"}"#).expect("decode");
        assert_eq!(case, GoldenCase::new("q", "a"));
    }
}
