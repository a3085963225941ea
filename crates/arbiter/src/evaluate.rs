//! Per-mode submission evaluation.
//!
//! Every mode goes through the single [`evaluate`] entry point, which
//! dispatches on the closed [`GameMode`] variant. Sandbox failures
//! (timeouts, crashes) are comparison inputs here, never engine errors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use colosseum_common::{GameMode, Language, Problem, TestCase};
use vulcan::Executor;

use crate::scoring::{quiz_score, shuffle_accuracy, test_quality};
use crate::verdict::{EvalArtifacts, Verdict};

/// One player submission, covering every mode's payload shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub code: String,
    pub language: Language,
    /// Code Shuffle: the player's reordering of the shuffled lines
    #[serde(default)]
    pub arranged_lines: Option<Vec<String>>,
    /// Test Master: the authored test cases
    #[serde(default)]
    pub test_cases: Option<Vec<TestCase>>,
    /// Code Quiz: question index -> selected option index
    #[serde(default)]
    pub quiz_answers: Option<HashMap<usize, usize>>,
    /// Code Quiz: seconds spent answering
    #[serde(default)]
    pub quiz_time_taken: Option<u64>,
}

/// Evaluate a submission against its problem under the given mode.
pub async fn evaluate(
    mode: GameMode,
    submission: &Submission,
    problem: &Problem,
    executor: &Executor,
    time_limit_secs: u64,
) -> Verdict {
    match mode {
        GameMode::Standard => evaluate_standard(submission, problem, executor).await,
        GameMode::BugHunt => evaluate_bug_hunt(submission, problem, executor).await,
        GameMode::CodeShuffle => evaluate_code_shuffle(submission, problem, executor).await,
        GameMode::TestMaster => evaluate_test_master(submission),
        GameMode::CodeQuiz => evaluate_code_quiz(submission, problem, time_limit_secs),
    }
}

/// Standard: all test cases must pass with exact (trimmed) output match.
/// Full pass scores 100; no partial credit.
async fn evaluate_standard(
    submission: &Submission,
    problem: &Problem,
    executor: &Executor,
) -> Verdict {
    let report = executor
        .run_all(&submission.code, submission.language, &problem.test_cases)
        .await;
    if report.all_passed {
        Verdict::accepted(100)
    } else {
        Verdict::rejected(format!(
            "Solution did not pass all test cases ({}/{} passed)",
            report.passed, report.total
        ))
    }
}

/// Bug Hunt: same bar as Standard against the player's fixed code; the
/// first failing case short-circuits with the failing input named.
async fn evaluate_bug_hunt(
    submission: &Submission,
    problem: &Problem,
    executor: &Executor,
) -> Verdict {
    let timeout_secs = executor.default_timeout_secs();
    for case in &problem.test_cases {
        let result = executor
            .execute(&submission.code, submission.language, &case.input, timeout_secs)
            .await;
        if !result.success || result.output.trim() != case.expected.trim() {
            return Verdict::rejected(format!(
                "Code still has bugs! Fix them and try again. Failed on input: {}",
                case.input
            ));
        }
    }
    Verdict::accepted(100)
}

/// Code Shuffle: join the arrangement and execute exactly as Standard.
/// Accuracy against the reference order is cosmetic only.
async fn evaluate_code_shuffle(
    submission: &Submission,
    problem: &Problem,
    executor: &Executor,
) -> Verdict {
    let Some(arranged_lines) = submission.arranged_lines.as_ref() else {
        return Verdict::rejected("No arranged lines provided");
    };
    let Some(reference_code) = problem.reference_code.get(&submission.language) else {
        return Verdict::rejected("No reference code available");
    };

    let arranged_code = arranged_lines.join("\n");
    let report = executor
        .run_all(&arranged_code, submission.language, &problem.test_cases)
        .await;

    if !report.all_passed {
        let mut reason = format!(
            "Arranged code doesn't pass all tests! ({}/{} passed)",
            report.passed, report.total
        );
        if let Some(failed) = report.first_failure() {
            reason.push_str(&format!(
                "\nFailed test:\n  Input: {}\n  Expected: {}\n  Got: {}",
                failed.input, failed.expected, failed.actual
            ));
            if !failed.error.is_empty() {
                reason.push_str(&format!("\n  Error: {}", failed.error));
            }
        }
        return Verdict::rejected(reason);
    }

    let accuracy = shuffle_accuracy(reference_code, arranged_lines);
    tracing::debug!(accuracy, "Code shuffle arrangement accepted");
    Verdict::accepted_with(
        100,
        EvalArtifacts {
            arranged_code: Some(arranged_code),
            shuffle_accuracy: Some(accuracy),
            ..EvalArtifacts::default()
        },
    )
}

/// Test Master: score the authored cases, pass at 60 or better
fn evaluate_test_master(submission: &Submission) -> Verdict {
    let Some(test_cases) = submission.test_cases.as_ref() else {
        return Verdict::rejected("No test cases provided");
    };
    let score = test_quality(test_cases);
    if score < 60 {
        return Verdict::rejected(format!(
            "Test cases quality too low: {score}/100. Need at least 60"
        ));
    }
    Verdict::accepted_with(
        score,
        EvalArtifacts {
            test_cases_score: Some(score),
            ..EvalArtifacts::default()
        },
    )
}

/// Code Quiz: no pass/fail gate; every submission is scored and accepted
fn evaluate_code_quiz(
    submission: &Submission,
    problem: &Problem,
    time_limit_secs: u64,
) -> Verdict {
    let empty = HashMap::new();
    let answers = submission.quiz_answers.as_ref().unwrap_or(&empty);
    let breakdown = quiz_score(
        answers,
        &problem.quiz_questions,
        submission.quiz_time_taken.unwrap_or(0),
        time_limit_secs,
    );
    Verdict::accepted_with(
        breakdown.score,
        EvalArtifacts {
            quiz: Some(breakdown),
            ..EvalArtifacts::default()
        },
    )
}
