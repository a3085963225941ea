//! Common types used across Colosseum services.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player identity. Human players carry a store id; the synthetic
/// opponent is always the literal [`BOT_PLAYER_ID`].
pub type PlayerId = String;

/// Reserved identity for the simulated bot opponent
pub const BOT_PLAYER_ID: &str = "bot";

/// Match ID type
pub type MatchId = Uuid;

/// Lobby ID type
pub type LobbyId = Uuid;

/// Problem ID type
pub type ProblemId = Uuid;

/// Game mode dispatched through the mode evaluators.
///
/// A closed variant: adding or removing a mode is a compile-time-checked
/// change, never a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Execute-and-verify against the problem's test cases
    Standard,
    /// Fix a subtly broken starter and make the tests pass
    BugHunt,
    /// Reorder shuffled reference-solution lines
    CodeShuffle,
    /// Author test cases instead of code
    TestMaster,
    /// Multiple-choice code quiz, no execution
    CodeQuiz,
}

impl GameMode {
    /// The problem pool a mode draws from. TestMaster plays standard
    /// problems; CodeQuiz draws quiz questions instead of test cases.
    pub fn problem_pool(&self) -> GameMode {
        match self {
            GameMode::TestMaster => GameMode::Standard,
            other => *other,
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Standard => write!(f, "standard"),
            GameMode::BugHunt => write!(f, "bug_hunt"),
            GameMode::CodeShuffle => write!(f, "code_shuffle"),
            GameMode::TestMaster => write!(f, "test_master"),
            GameMode::CodeQuiz => write!(f, "code_quiz"),
        }
    }
}

/// Submission language. Only Python is executable on the host; the other
/// variants are reference-only until a compiled-language runner lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Javascript,
    Cpp,
    Java,
}

impl Language {
    /// Whether the local sandbox can run this language
    pub fn is_executable(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Javascript => write!(f, "javascript"),
            Language::Cpp => write!(f, "cpp"),
            Language::Java => write!(f, "java"),
        }
    }
}

/// Problem difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Quiz points awarded for a correct answer at this difficulty
    pub fn quiz_points(&self) -> i64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Lobby/match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Open for players
    Waiting,
    /// In progress
    Active,
    /// Terminal; immutable except for audit reads
    Completed,
}

/// A single test case: textual input and the expected (trimmed) output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected: String,
}

/// One multiple-choice quiz question with a single correct option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    /// Code snippet the question refers to, if any
    #[serde(default)]
    pub code: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub difficulty: Difficulty,
}

impl QuizQuestion {
    /// Difficulty-weighted points for answering this question correctly
    pub fn points(&self) -> i64 {
        self.difficulty.quiz_points()
    }
}

/// Immutable puzzle definition. Created by the generator or seed process;
/// read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub test_cases: Vec<TestCase>,
    /// Per-language complete working solution
    #[serde(default)]
    pub reference_code: HashMap<Language, String>,
    /// Pre-authored buggy variant, if any
    #[serde(default)]
    pub buggy_code: HashMap<Language, String>,
    #[serde(default)]
    pub starter_code: HashMap<Language, String>,
    #[serde(default)]
    pub hint: String,
    /// The pool this problem was created for
    pub mode: GameMode,
    /// Pre-generated questions for CodeQuiz problems
    #[serde(default)]
    pub quiz_questions: Vec<QuizQuestion>,
}

/// Record of one accepted problem inside a race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub problem_id: ProblemId,
    pub time: f64,
    pub score: i64,
    pub passed: bool,
}

/// Per-player mutable slice of a lobby or match.
///
/// Invariant: `current_problem_index` is monotonically non-decreasing and
/// never exceeds the race length; `completed` is true exactly when
/// `current_problem_index` equals the race length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub user_id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub time_elapsed: f64,
    #[serde(default)]
    pub used_hints: bool,
    #[serde(default)]
    pub submission_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub rank: Option<u32>,
    // Code Shuffle scratch
    #[serde(default)]
    pub shuffled_lines: Option<Vec<String>>,
    #[serde(default)]
    pub arranged_code: Option<String>,
    // Test Master scratch
    #[serde(default)]
    pub test_cases_created: Option<Vec<TestCase>>,
    #[serde(default)]
    pub test_cases_score: Option<i64>,
    // Code Quiz scratch
    #[serde(default)]
    pub quiz_answers: Option<HashMap<usize, usize>>,
    #[serde(default)]
    pub quiz_score: Option<i64>,
    // Multi-problem race progress
    #[serde(default)]
    pub current_problem_index: usize,
    #[serde(default)]
    pub problems_solved: usize,
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub bot_rating: Option<i64>,
}

impl PlayerSlot {
    /// Fresh slot for a human player joining a lobby or match
    pub fn new(user_id: impl Into<PlayerId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            code: String::new(),
            completed: false,
            time_elapsed: 0.0,
            used_hints: false,
            submission_time: None,
            score: 0,
            rank: None,
            shuffled_lines: None,
            arranged_code: None,
            test_cases_created: None,
            test_cases_score: None,
            quiz_answers: None,
            quiz_score: None,
            current_problem_index: 0,
            problems_solved: 0,
            submissions: Vec::new(),
            is_bot: false,
            bot_rating: None,
        }
    }

    /// Slot for a synthetic bot opponent
    pub fn bot(username: impl Into<String>, rating: i64) -> Self {
        let mut slot = Self::new(BOT_PLAYER_ID, username);
        slot.is_bot = true;
        slot.bot_rating = Some(rating);
        slot
    }
}

/// Pre-match waiting room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    pub id: LobbyId,
    /// Short shareable code players join with
    pub game_id: String,
    pub lobby_name: String,
    pub host_id: PlayerId,
    pub host_username: String,
    pub game_mode: GameMode,
    /// Ordered problems of the race
    pub problem_ids: Vec<ProblemId>,
    pub total_problems: usize,
    pub time_limit_seconds: u64,
    pub max_players: usize,
    pub players: Vec<PlayerSlot>,
    /// Mode artifacts generated once at creation, shared by every joiner
    #[serde(default)]
    pub buggy_code: Option<String>,
    #[serde(default)]
    pub shuffled_lines: Option<Vec<String>>,
    pub status: MatchStatus,
    #[serde(default)]
    pub match_id: Option<MatchId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl Lobby {
    pub fn player(&self, user_id: &str) -> Option<&PlayerSlot> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }
}

/// Active-phase counterpart of a lobby. Internally always an ordered list
/// of player slots; the legacy two-named-slot 1v1 shape lives in
/// [`crate::legacy`] as a serialization concern only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Lobby code this match came from, if any
    #[serde(default)]
    pub game_id: Option<String>,
    pub game_mode: GameMode,
    pub problem_ids: Vec<ProblemId>,
    pub total_problems: usize,
    #[serde(default)]
    pub buggy_code: Option<String>,
    #[serde(default)]
    pub shuffled_lines: Option<Vec<String>>,
    #[serde(default)]
    pub host_id: Option<PlayerId>,
    pub max_players: usize,
    pub players: Vec<PlayerSlot>,
    pub time_limit_seconds: u64,
    pub status: MatchStatus,
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    /// Top-3 finishers in rank order
    #[serde(default)]
    pub winners: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn player(&self, user_id: &str) -> Option<&PlayerSlot> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn player_mut(&mut self, user_id: &str) -> Option<&mut PlayerSlot> {
        self.players.iter_mut().find(|p| p.user_id == user_id)
    }

    /// True once every slot (human or bot) has finished the race
    pub fn all_completed(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.completed)
    }
}

/// Player record as the rating store sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub username: String,
    pub rating: i64,
    pub xp: i64,
}
