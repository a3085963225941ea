//! Pure scoring and rating functions.
//!
//! Everything here is deterministic arithmetic over submission facts; the
//! match engine composes these at submission and finalization time.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use colosseum_common::{QuizQuestion, TestCase};

/// ELO K-factor for the legacy two-party rating delta
const K_FACTOR: f64 = 32.0;

/// Minimum rating movement in a decided 1v1
const MIN_RATING_CHANGE: i64 = 10;

/// Speed bonus awarded on an accepted submission, scaled by time left
pub fn time_bonus(elapsed_secs: f64, time_limit_secs: u64) -> i64 {
    if time_limit_secs == 0 {
        return 0;
    }
    let ratio = (elapsed_secs / time_limit_secs as f64).min(1.0);
    ((1.0 - ratio) * 50.0).round() as i64
}

/// Cosmetic Code Shuffle accuracy: percentage of trimmed lines sitting in
/// the same position as the reference order. Zero on length mismatch.
pub fn shuffle_accuracy(original: &str, arranged: &[String]) -> i64 {
    let original_lines: Vec<&str> = original
        .trim()
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let arranged_lines: Vec<&str> = arranged
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if original_lines.len() != arranged_lines.len() || original_lines.is_empty() {
        return 0;
    }

    let correct = original_lines
        .iter()
        .zip(arranged_lines.iter())
        .filter(|(o, a)| o == a)
        .count();
    (correct as i64 * 100) / original_lines.len() as i64
}

static EDGE_CASE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\b0\b", r"-\d+", r"\[\]", r#""""#, r"''", r"\bNone\b", r"\bnull\b"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// Test Master quality heuristic.
///
/// min(10 x count, 50) for quantity, +20 at three cases, +15 at five
/// (cumulative), +5 per case whose input matches an edge-case pattern
/// (at most once per case), capped at 100.
pub fn test_quality(test_cases: &[TestCase]) -> i64 {
    if test_cases.is_empty() {
        return 0;
    }

    let mut score = (test_cases.len() as i64 * 10).min(50);
    if test_cases.len() >= 3 {
        score += 20;
    }
    if test_cases.len() >= 5 {
        score += 15;
    }

    for case in test_cases {
        if EDGE_CASE_PATTERNS.iter().any(|p| p.is_match(&case.input)) {
            score += 5;
        }
    }

    score.min(100)
}

/// Quiz result breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizBreakdown {
    pub score: i64,
    pub base_points: i64,
    pub time_bonus: i64,
    pub correct: usize,
    pub total: usize,
    pub time_taken: u64,
}

/// Difficulty-weighted quiz score plus a speed bonus of up to 50
pub fn quiz_score(
    answers: &HashMap<usize, usize>,
    questions: &[QuizQuestion],
    time_taken_secs: u64,
    time_limit_secs: u64,
) -> QuizBreakdown {
    let mut correct = 0usize;
    let mut base_points = 0i64;

    for (idx, question) in questions.iter().enumerate() {
        if answers.get(&idx) == Some(&question.correct_answer) {
            correct += 1;
            base_points += question.points();
        }
    }

    let time_bonus = if time_limit_secs == 0 {
        0
    } else {
        let ratio = (1.0 - time_taken_secs as f64 / time_limit_secs as f64).max(0.0);
        (ratio * 50.0).round() as i64
    };

    QuizBreakdown {
        score: base_points + time_bonus,
        base_points,
        time_bonus,
        correct,
        total: questions.len(),
        time_taken: time_taken_secs,
    }
}

/// ELO-style rating delta for the legacy two-party path.
///
/// Symmetric: the winner gains exactly what the loser drops (subject to
/// the store floor). A no-hints win earns a flat +10 on top; the result
/// never falls below [`MIN_RATING_CHANGE`].
pub fn rating_change(winner_rating: i64, loser_rating: i64, used_hints: bool) -> i64 {
    let expected_winner =
        1.0 / (1.0 + 10f64.powf((loser_rating - winner_rating) as f64 / 400.0));
    let mut change = (K_FACTOR * (1.0 - expected_winner)).round() as i64;
    if !used_hints {
        change += 10;
    }
    change.max(MIN_RATING_CHANGE)
}

/// Time-tiered XP bonus for a 1v1 winner
pub fn xp_bonus(elapsed_secs: f64, time_limit_secs: u64, used_hints: bool) -> i64 {
    let base_xp = 100;
    let time_ratio = if time_limit_secs == 0 {
        1.0
    } else {
        elapsed_secs / time_limit_secs as f64
    };
    let time_tier = if time_ratio < 0.25 {
        50
    } else if time_ratio < 0.5 {
        30
    } else {
        10
    };
    let no_hints_bonus = if used_hints { 0 } else { 50 };
    base_xp + time_tier + no_hints_bonus
}

/// XP and rating awarded to a human podium finisher in a multiplayer
/// race. Magnitudes are policy, but they decrease monotonically by rank.
pub fn podium_awards(rank: u32) -> Option<(i64, i64)> {
    match rank {
        1 => Some((100, 30)),
        2 => Some((50, 15)),
        3 => Some((25, 5)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colosseum_common::Difficulty;

    fn case(input: &str) -> TestCase {
        TestCase {
            input: input.into(),
            expected: "x".into(),
        }
    }

    #[test]
    fn test_time_bonus_curve() {
        assert_eq!(time_bonus(0.0, 100), 50);
        assert_eq!(time_bonus(50.0, 100), 25);
        assert_eq!(time_bonus(100.0, 100), 0);
        // Overtime clamps at zero rather than going negative
        assert_eq!(time_bonus(500.0, 100), 0);
    }

    #[test]
    fn test_shuffle_accuracy_positional() {
        let original = "a = 1\nb = 2\nc = 3";
        let perfect: Vec<String> = vec!["a = 1".into(), "  b = 2".into(), "c = 3".into()];
        assert_eq!(shuffle_accuracy(original, &perfect), 100);

        let partial: Vec<String> = vec!["b = 2".into(), "a = 1".into(), "c = 3".into()];
        assert_eq!(shuffle_accuracy(original, &partial), 33);

        let short: Vec<String> = vec!["a = 1".into()];
        assert_eq!(shuffle_accuracy(original, &short), 0);
    }

    #[test]
    fn test_quality_five_cases_three_edge_scores_exactly_100() {
        // 50 quantity + 20 (>=3) + 15 (>=5) + 15 edge = 100, capped at 100
        let cases = vec![
            case("0"),
            case("-5"),
            case("[]"),
            case("[1, 2, 3]"),
            case("hello"),
        ];
        assert_eq!(test_quality(&cases), 100);
    }

    #[test]
    fn test_quality_edge_bonus_counts_once_per_case() {
        // One case matching two patterns earns a single +5
        let cases = vec![case("0, -1")];
        assert_eq!(test_quality(&cases), 15);
    }

    #[test]
    fn test_quality_quantity_tiers() {
        assert_eq!(test_quality(&[]), 0);
        assert_eq!(test_quality(&[case("a")]), 10);
        let three = vec![case("a"), case("b"), case("c")];
        assert_eq!(test_quality(&three), 50);
    }

    #[test]
    fn test_quiz_scoring_weights_and_bonus() {
        let questions = vec![
            QuizQuestion {
                prompt: "q1".into(),
                code: None,
                options: vec!["a".into(), "b".into()],
                correct_answer: 0,
                difficulty: Difficulty::Easy,
            },
            QuizQuestion {
                prompt: "q2".into(),
                code: None,
                options: vec!["a".into(), "b".into()],
                correct_answer: 1,
                difficulty: Difficulty::Hard,
            },
        ];
        let mut answers = HashMap::new();
        answers.insert(0, 0); // correct, easy: 10
        answers.insert(1, 0); // wrong

        let result = quiz_score(&answers, &questions, 30, 60);
        assert_eq!(result.base_points, 10);
        assert_eq!(result.time_bonus, 25);
        assert_eq!(result.score, 35);
        assert_eq!(result.correct, 1);

        // Overtime is clamped, never negative
        let slow = quiz_score(&answers, &questions, 120, 60);
        assert_eq!(slow.time_bonus, 0);
    }

    #[test]
    fn test_rating_change_floor_and_hint_bonus() {
        // Evenly matched, no hints: 16 + 10
        assert_eq!(rating_change(1200, 1200, false), 26);
        assert_eq!(rating_change(1200, 1200, true), 16);
        // Heavy favourite still moves by the minimum
        assert_eq!(rating_change(2400, 800, true), MIN_RATING_CHANGE);
    }

    #[test]
    fn test_xp_bonus_tiers() {
        assert_eq!(xp_bonus(10.0, 100, false), 200);
        assert_eq!(xp_bonus(30.0, 100, false), 180);
        assert_eq!(xp_bonus(90.0, 100, true), 110);
    }

    #[test]
    fn test_podium_awards_monotonically_decrease() {
        let first = podium_awards(1).unwrap();
        let second = podium_awards(2).unwrap();
        let third = podium_awards(3).unwrap();
        assert!(first.0 > second.0 && second.0 > third.0);
        assert!(first.1 > second.1 && second.1 > third.1);
        assert!(podium_awards(4).is_none());
    }
}
