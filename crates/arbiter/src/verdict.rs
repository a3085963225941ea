//! Evaluation verdict types

use serde::{Deserialize, Serialize};

use crate::scoring::QuizBreakdown;

/// Mode-specific byproducts of an accepted evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalArtifacts {
    /// Code Shuffle: the joined arrangement that was executed
    #[serde(default)]
    pub arranged_code: Option<String>,
    /// Code Shuffle: cosmetic positional accuracy percentage.
    /// Reported for the UI only; never gates pass/fail or the score.
    #[serde(default)]
    pub shuffle_accuracy: Option<i64>,
    /// Test Master: the quality score that was computed
    #[serde(default)]
    pub test_cases_score: Option<i64>,
    /// Code Quiz: per-question breakdown
    #[serde(default)]
    pub quiz: Option<QuizBreakdown>,
}

/// Outcome of evaluating one submission against one problem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Submission passed; progress advances
    Accepted {
        raw_score: i64,
        artifacts: EvalArtifacts,
    },
    /// Submission failed the test cases or quality bar. The reason is
    /// surfaced to the player unchanged; resubmission stays allowed.
    Rejected { reason: String },
}

impl Verdict {
    pub fn accepted(raw_score: i64) -> Self {
        Verdict::Accepted {
            raw_score,
            artifacts: EvalArtifacts::default(),
        }
    }

    pub fn accepted_with(raw_score: i64, artifacts: EvalArtifacts) -> Self {
        Verdict::Accepted {
            raw_score,
            artifacts,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Verdict::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_helpers() {
        assert!(Verdict::accepted(100).is_accepted());
        assert!(!Verdict::rejected("nope").is_accepted());
    }
}
