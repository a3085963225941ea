//! The match engine: lobby lifecycle, matchmaking, submissions, hints
//! and finalization.
//!
//! Concurrency model: the engine never holds its own locks. Every
//! mutation is pushed into the store as a conditional closure that
//! revalidates against the freshest state, so a lost race degrades to a
//! `Conflict` instead of corrupting a match. Finalization in particular
//! may be attempted by a human submission and a bot timer at once;
//! whoever commits the completed transition first hands out the awards,
//! the other attempt is a no-op.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use arbiter::scoring::{podium_awards, rating_change, time_bonus, xp_bonus};
use arbiter::{Submission, Verdict, evaluate};
use colosseum_common::{
    AppResult, ArenaError, Difficulty, GameMode, Language, Lobby, LobbyId, Match, MatchId,
    MatchStatus, PlayerSlot, Problem, ProblemId, SubmissionRecord,
};
use proteus::{generate_buggy_code, shuffle_code};
use vulcan::Executor;

use crate::bot;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::generator::{ProblemGenerator, StaticPool};
use crate::store::{
    DEFAULT_RATING, LobbyStore, MatchStore, MemoryStore, PlayerStore, ProblemStore,
};
use crate::timers::{TimerKind, TimerRegistry};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const QUIZ_QUESTION_COUNT: usize = 6;
const DIFFICULTY_LADDER: [Difficulty; 5] = [
    Difficulty::Easy,
    Difficulty::Easy,
    Difficulty::Medium,
    Difficulty::Medium,
    Difficulty::Hard,
];

/// What an accepted submission produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// More problems remain in the race
    Progressed {
        final_score: i64,
        next_problem: Box<Problem>,
    },
    /// The submitter finished the race. The match itself completes only
    /// once every slot has finished.
    Finished {
        final_score: i64,
        match_completed: bool,
    },
}

/// Engine over pluggable stores. Cheap to clone; timer tasks hold their
/// own handle to it.
#[derive(Clone)]
pub struct MatchEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    problems: Arc<dyn ProblemStore>,
    players: Arc<dyn PlayerStore>,
    lobbies: Arc<dyn LobbyStore>,
    matches: Arc<dyn MatchStore>,
    generator: Arc<dyn ProblemGenerator>,
    executor: Arc<Executor>,
    timers: TimerRegistry,
}

impl MatchEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        problems: Arc<dyn ProblemStore>,
        players: Arc<dyn PlayerStore>,
        lobbies: Arc<dyn LobbyStore>,
        matches: Arc<dyn MatchStore>,
        generator: Arc<dyn ProblemGenerator>,
        executor: Arc<Executor>,
    ) -> Self {
        Self {
            config,
            clock,
            problems,
            players,
            lobbies,
            matches,
            generator,
            executor,
            timers: TimerRegistry::new(),
        }
    }

    /// Fully in-memory engine seeded with the static catalog
    pub async fn in_memory(config: EngineConfig) -> AppResult<Self> {
        let store = Arc::new(MemoryStore::new());
        let pool = StaticPool::new();
        pool.seed(store.as_ref()).await?;
        Ok(Self::new(
            config,
            Arc::new(SystemClock),
            Arc::clone(&store) as Arc<dyn ProblemStore>,
            Arc::clone(&store) as Arc<dyn PlayerStore>,
            Arc::clone(&store) as Arc<dyn LobbyStore>,
            store as Arc<dyn MatchStore>,
            Arc::new(pool),
            Arc::new(Executor::new(vulcan::SandboxConfig::from_env())),
        ))
    }

    // ----- lobby lifecycle -----

    pub async fn create_lobby(
        &self,
        host_id: &str,
        host_username: &str,
        lobby_name: &str,
        mode: GameMode,
        max_players: usize,
        time_limit_seconds: Option<u64>,
    ) -> AppResult<Lobby> {
        if !(self.config.min_players..=self.config.max_players).contains(&max_players) {
            return Err(ArenaError::Validation(format!(
                "max_players must be between {} and {}",
                self.config.min_players, self.config.max_players
            )));
        }

        self.players.get_or_create(host_id, host_username).await?;
        let race = self.select_race(mode).await?;
        let code = self.mint_lobby_code().await?;
        let (buggy_code, shuffled_lines) = mode_artifacts(mode, race.first());

        let mut host_slot = PlayerSlot::new(host_id, host_username);
        host_slot.shuffled_lines = shuffled_lines.clone();

        let lobby = Lobby {
            id: Uuid::new_v4(),
            game_id: code,
            lobby_name: lobby_name.to_string(),
            host_id: host_id.to_string(),
            host_username: host_username.to_string(),
            game_mode: mode,
            problem_ids: race.iter().map(|p| p.id).collect(),
            total_problems: race.len(),
            time_limit_seconds: time_limit_seconds
                .unwrap_or(self.config.default_time_limit_secs),
            max_players,
            players: vec![host_slot],
            buggy_code,
            shuffled_lines,
            status: MatchStatus::Waiting,
            match_id: None,
            created_at: self.clock.now(),
            started_at: None,
        };
        self.lobbies.insert(lobby.clone()).await?;
        tracing::info!(
            lobby_id = %lobby.id,
            code = %lobby.game_id,
            mode = %mode,
            "Lobby created"
        );
        Ok(lobby)
    }

    pub async fn join_lobby(
        &self,
        code: &str,
        user_id: &str,
        username: &str,
    ) -> AppResult<Lobby> {
        let lobby = self.lobbies.get_by_code(code).await?;
        self.players.get_or_create(user_id, username).await?;

        let user = user_id.to_string();
        let name = username.to_string();
        let updated = self
            .lobbies
            .update(
                lobby.id,
                Box::new(move |l| {
                    if l.status != MatchStatus::Waiting {
                        return Err(ArenaError::Conflict("Game has already started".into()));
                    }
                    if l.player(&user).is_some() {
                        return Err(ArenaError::Conflict("Already in this lobby".into()));
                    }
                    if l.is_full() {
                        return Err(ArenaError::Conflict("Lobby is full".into()));
                    }
                    let mut slot = PlayerSlot::new(user.clone(), name.clone());
                    slot.shuffled_lines = l.shuffled_lines.clone();
                    l.players.push(slot);
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| ArenaError::Internal("Lobby emptied during join".into()))?;
        tracing::debug!(lobby_id = %updated.id, user_id, "Player joined lobby");
        Ok(updated)
    }

    /// Leave a waiting lobby. Host role moves to the next joiner; an
    /// emptied lobby is deleted and `None` returned.
    pub async fn leave_lobby(&self, lobby_id: LobbyId, user_id: &str) -> AppResult<Option<Lobby>> {
        let user = user_id.to_string();
        self.lobbies
            .update(
                lobby_id,
                Box::new(move |l| {
                    if l.status != MatchStatus::Waiting {
                        return Err(ArenaError::Conflict(
                            "Cannot leave after the game has started".into(),
                        ));
                    }
                    let idx = l
                        .players
                        .iter()
                        .position(|p| p.user_id == user)
                        .ok_or_else(|| ArenaError::NotFound("Player not in lobby".into()))?;
                    l.players.remove(idx);
                    if l.host_id == user {
                        if let Some(next) = l.players.first() {
                            l.host_id = next.user_id.clone();
                            l.host_username = next.username.clone();
                        }
                    }
                    Ok(())
                }),
            )
            .await
    }

    /// Start a waiting lobby. Host only; needs at least the minimum
    /// player count. Materializes the match and flips the lobby active.
    pub async fn start_lobby(&self, lobby_id: LobbyId, host_id: &str) -> AppResult<Match> {
        let match_id = Uuid::new_v4();
        let now = self.clock.now();
        let host = host_id.to_string();
        let min_players = self.config.min_players;
        let lobby = self
            .lobbies
            .update(
                lobby_id,
                Box::new(move |l| {
                    if l.host_id != host {
                        return Err(ArenaError::Validation(
                            "Only the host can start the game".into(),
                        ));
                    }
                    if l.status != MatchStatus::Waiting {
                        return Err(ArenaError::Conflict("Game has already started".into()));
                    }
                    if l.players.len() < min_players {
                        return Err(ArenaError::Validation(format!(
                            "Need at least {min_players} players to start"
                        )));
                    }
                    l.status = MatchStatus::Active;
                    l.match_id = Some(match_id);
                    l.started_at = Some(now);
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| ArenaError::Internal("Lobby emptied during start".into()))?;

        let m = Match {
            id: match_id,
            game_id: Some(lobby.game_id.clone()),
            game_mode: lobby.game_mode,
            problem_ids: lobby.problem_ids.clone(),
            total_problems: lobby.total_problems,
            buggy_code: lobby.buggy_code.clone(),
            shuffled_lines: lobby.shuffled_lines.clone(),
            host_id: Some(lobby.host_id.clone()),
            max_players: lobby.max_players,
            players: lobby.players.clone(),
            time_limit_seconds: lobby.time_limit_seconds,
            status: MatchStatus::Active,
            winner_id: None,
            winners: Vec::new(),
            created_at: lobby.created_at,
            started_at: Some(now),
            completed_at: None,
        };
        self.matches.insert(m.clone()).await?;
        tracing::info!(
            match_id = %match_id,
            lobby_id = %lobby_id,
            players = m.players.len(),
            "Lobby started"
        );
        Ok(m)
    }

    pub async fn get_lobby(&self, id: LobbyId) -> AppResult<Lobby> {
        self.lobbies.get(id).await
    }

    pub async fn get_lobby_by_code(&self, code: &str) -> AppResult<Lobby> {
        self.lobbies.get_by_code(code).await
    }

    pub async fn list_lobbies(
        &self,
        status: Option<MatchStatus>,
        mode: Option<GameMode>,
    ) -> AppResult<Vec<Lobby>> {
        self.lobbies.list(status, mode).await
    }

    // ----- matchmaking -----

    /// Join the oldest compatible waiting match, or open a new one that
    /// falls back to a bot after the grace window.
    pub async fn quick_match(
        &self,
        user_id: &str,
        username: &str,
        mode: GameMode,
    ) -> AppResult<Match> {
        self.players.get_or_create(user_id, username).await?;

        if let Some(waiting) = self.matches.find_waiting(mode, user_id).await? {
            match self.join_waiting_match(&waiting, user_id, username).await {
                Ok(joined) => return Ok(joined),
                // Lost the slot to a concurrent joiner; open a fresh match
                Err(ArenaError::Conflict(_)) => {}
                Err(err) => return Err(err),
            }
        }
        self.open_matchmaking_slot(user_id, username, mode).await
    }

    async fn join_waiting_match(
        &self,
        waiting: &Match,
        user_id: &str,
        username: &str,
    ) -> AppResult<Match> {
        let now = self.clock.now();
        let user = user_id.to_string();
        let name = username.to_string();
        let joined = self
            .matches
            .update(
                waiting.id,
                Box::new(move |m| {
                    if m.status != MatchStatus::Waiting {
                        return Err(ArenaError::Conflict("Match is no longer waiting".into()));
                    }
                    if m.player(&user).is_some() {
                        return Err(ArenaError::Conflict("Already in this match".into()));
                    }
                    if m.players.len() >= m.max_players {
                        return Err(ArenaError::Conflict("Match is full".into()));
                    }
                    let mut slot = PlayerSlot::new(user.clone(), name.clone());
                    slot.shuffled_lines = m.shuffled_lines.clone();
                    m.players.push(slot);
                    if m.players.len() == m.max_players {
                        m.status = MatchStatus::Active;
                        m.started_at = Some(now);
                    }
                    Ok(())
                }),
            )
            .await?;

        if joined.status == MatchStatus::Active {
            self.timers.cancel(joined.id, TimerKind::BotAssign);
            tracing::info!(match_id = %joined.id, "Matchmaking paired two players");
        }
        Ok(joined)
    }

    async fn open_matchmaking_slot(
        &self,
        user_id: &str,
        username: &str,
        mode: GameMode,
    ) -> AppResult<Match> {
        let race = self.select_race(mode).await?;
        let (buggy_code, shuffled_lines) = mode_artifacts(mode, race.first());
        let mut slot = PlayerSlot::new(user_id, username);
        slot.shuffled_lines = shuffled_lines.clone();

        let m = Match {
            id: Uuid::new_v4(),
            game_id: None,
            game_mode: mode,
            problem_ids: race.iter().map(|p| p.id).collect(),
            total_problems: race.len(),
            buggy_code,
            shuffled_lines,
            host_id: None,
            max_players: 2,
            players: vec![slot],
            time_limit_seconds: self.config.default_time_limit_secs,
            status: MatchStatus::Waiting,
            winner_id: None,
            winners: Vec::new(),
            created_at: self.clock.now(),
            started_at: None,
            completed_at: None,
        };
        self.matches.insert(m.clone()).await?;

        let engine = self.clone();
        let match_id = m.id;
        self.timers.schedule(
            match_id,
            TimerKind::BotAssign,
            Duration::from_secs(self.config.bot_grace_secs),
            async move {
                if let Err(err) = engine.assign_bot(match_id).await {
                    tracing::debug!(match_id = %match_id, error = %err, "Bot assignment skipped");
                }
            },
        );
        tracing::info!(match_id = %match_id, mode = %mode, "Matchmaking slot opened");
        Ok(m)
    }

    /// Attach a bot to a still-waiting matchmaking slot and arm its
    /// completion timer. No-op if a human joined in the meantime.
    pub async fn assign_bot(&self, match_id: MatchId) -> AppResult<Match> {
        let current = self.matches.get(match_id).await?;
        let requester_rating = match current.players.first() {
            Some(p) => self
                .players
                .get(&p.user_id)
                .await
                .map(|profile| profile.rating)
                .unwrap_or(DEFAULT_RATING),
            None => DEFAULT_RATING,
        };
        let (bot_name, bot_rating) = {
            let mut rng = rand::rng();
            (
                bot::pick_name(&mut rng),
                bot::rating_near(requester_rating, &mut rng),
            )
        };

        let now = self.clock.now();
        let updated = self
            .matches
            .update(
                match_id,
                Box::new(move |m| {
                    if m.status != MatchStatus::Waiting {
                        return Err(ArenaError::Conflict("Match is no longer waiting".into()));
                    }
                    let mut slot = PlayerSlot::bot(bot_name, bot_rating);
                    slot.shuffled_lines = m.shuffled_lines.clone();
                    m.players.push(slot);
                    m.status = MatchStatus::Active;
                    m.started_at = Some(now);
                    Ok(())
                }),
            )
            .await?;

        let delay = {
            let mut rng = rand::rng();
            bot::completion_delay(bot_rating, self.config.bot_base_secs, &mut rng)
        };
        let engine = self.clone();
        self.timers.schedule(match_id, TimerKind::BotComplete, delay, async move {
            if let Err(err) = engine.complete_bot(match_id).await {
                tracing::debug!(match_id = %match_id, error = %err, "Bot completion skipped");
            }
        });
        tracing::info!(
            match_id = %match_id,
            bot = bot_name,
            rating = bot_rating,
            delay_secs = delay.as_secs(),
            "Bot opponent attached"
        );
        Ok(updated)
    }

    /// Mark the bot slot finished with every problem solved, then try
    /// to finalize. Safe to call on an already-finished match.
    pub async fn complete_bot(&self, match_id: MatchId) -> AppResult<()> {
        let now = self.clock.now();
        let result = self
            .matches
            .update(
                match_id,
                Box::new(move |m| {
                    if m.status == MatchStatus::Completed {
                        return Err(ArenaError::Conflict("Match already completed".into()));
                    }
                    let started = m.started_at.unwrap_or(m.created_at);
                    let total = m.total_problems;
                    let slot = m
                        .players
                        .iter_mut()
                        .find(|p| p.is_bot)
                        .ok_or_else(|| ArenaError::NotFound("No bot in this match".into()))?;
                    if slot.completed {
                        return Err(ArenaError::Conflict("Bot already finished".into()));
                    }
                    slot.current_problem_index = total;
                    slot.problems_solved = total;
                    slot.completed = true;
                    slot.submission_time = Some(now);
                    slot.time_elapsed = (now - started).num_milliseconds() as f64 / 1000.0;
                    Ok(())
                }),
            )
            .await;
        match result {
            Ok(_) => {
                self.finalize_if_complete(match_id).await?;
                Ok(())
            }
            Err(ArenaError::Conflict(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    // ----- gameplay -----

    pub async fn get_match(&self, id: MatchId) -> AppResult<Match> {
        self.matches.get(id).await
    }

    /// Handle one submission. Rejections surface the evaluator's reason
    /// unchanged and leave all match state untouched.
    pub async fn submit(
        &self,
        match_id: MatchId,
        user_id: &str,
        submission: Submission,
    ) -> AppResult<SubmitOutcome> {
        let m = self.matches.get(match_id).await?;
        if m.status != MatchStatus::Active {
            return Err(ArenaError::Conflict("Match is not active".into()));
        }
        let slot = m
            .player(user_id)
            .ok_or_else(|| ArenaError::NotFound("Player not in this match".into()))?;
        if slot.completed {
            return Err(ArenaError::Conflict(
                "You have already finished this race".into(),
            ));
        }
        let index = slot.current_problem_index;
        if index >= m.total_problems {
            return Err(ArenaError::Conflict("No problems remaining".into()));
        }
        let problem_id = m.problem_ids[index];
        let problem = self.problems.get(problem_id).await?;

        // Evaluation runs the sandbox; no store locks are held here
        let verdict = evaluate(
            m.game_mode,
            &submission,
            &problem,
            self.executor.as_ref(),
            m.time_limit_seconds,
        )
        .await;
        let (raw_score, artifacts) = match verdict {
            Verdict::Rejected { reason } => {
                tracing::debug!(match_id = %match_id, user_id, "Submission rejected");
                return Err(ArenaError::EvaluationRejected(reason));
            }
            Verdict::Accepted {
                raw_score,
                artifacts,
            } => (raw_score, artifacts),
        };

        let now = self.clock.now();
        let started = m.started_at.unwrap_or(m.created_at);
        let elapsed = (now - started).num_milliseconds() as f64 / 1000.0;
        // Quiz scoring already carries its own time bonus
        let bonus = if m.game_mode == GameMode::CodeQuiz {
            0
        } else {
            time_bonus(elapsed, m.time_limit_seconds)
        };
        let final_score = raw_score + bonus;

        let user = user_id.to_string();
        let code = submission.code.clone();
        let test_cases = submission.test_cases.clone();
        let quiz_answers = submission.quiz_answers.clone();
        let arranged_code = artifacts.arranged_code.clone();
        let test_cases_score = artifacts.test_cases_score;
        let quiz_score = artifacts.quiz.as_ref().map(|q| q.score);
        let updated = self
            .matches
            .update(
                match_id,
                Box::new(move |m| {
                    if m.status != MatchStatus::Active {
                        return Err(ArenaError::Conflict("Match is not active".into()));
                    }
                    let total = m.total_problems;
                    let slot = m
                        .player_mut(&user)
                        .ok_or_else(|| ArenaError::NotFound("Player not in this match".into()))?;
                    if slot.completed || slot.current_problem_index != index {
                        return Err(ArenaError::Conflict(
                            "Submission already processed".into(),
                        ));
                    }
                    slot.code = code.clone();
                    slot.arranged_code = arranged_code.clone();
                    slot.test_cases_created = test_cases.clone();
                    slot.test_cases_score = test_cases_score;
                    slot.quiz_answers = quiz_answers.clone();
                    slot.quiz_score = quiz_score;
                    slot.score = final_score;
                    slot.submissions.push(SubmissionRecord {
                        problem_id,
                        time: elapsed,
                        score: final_score,
                        passed: true,
                    });
                    slot.current_problem_index += 1;
                    slot.problems_solved += 1;
                    slot.submission_time = Some(now);
                    slot.time_elapsed = elapsed;
                    if slot.current_problem_index == total {
                        slot.completed = true;
                    }
                    Ok(())
                }),
            )
            .await?;

        let finished = updated
            .player(user_id)
            .map(|p| p.completed)
            .unwrap_or(false);
        tracing::info!(
            match_id = %match_id,
            user_id,
            final_score,
            problem_index = index,
            finished,
            "Submission accepted"
        );
        if finished {
            let match_completed = self.finalize_if_complete(match_id).await?;
            return Ok(SubmitOutcome::Finished {
                final_score,
                match_completed,
            });
        }
        let next = self.problems.get(updated.problem_ids[index + 1]).await?;
        Ok(SubmitOutcome::Progressed {
            final_score,
            next_problem: Box::new(next),
        })
    }

    /// Reveal the current problem's hint and flag the slot, which
    /// shrinks the finisher's XP and rating bonus.
    pub async fn use_hint(&self, match_id: MatchId, user_id: &str) -> AppResult<String> {
        let m = self.matches.get(match_id).await?;
        if m.status != MatchStatus::Active {
            return Err(ArenaError::Conflict("Match is not active".into()));
        }
        let slot = m
            .player(user_id)
            .ok_or_else(|| ArenaError::NotFound("Player not in this match".into()))?;
        if m.total_problems == 0 {
            return Err(ArenaError::NotFound("Match has no problems".into()));
        }
        let index = slot.current_problem_index.min(m.total_problems - 1);
        let problem = self.problems.get(m.problem_ids[index]).await?;

        let user = user_id.to_string();
        self.matches
            .update(
                match_id,
                Box::new(move |m| {
                    if let Some(slot) = m.player_mut(&user) {
                        slot.used_hints = true;
                    }
                    Ok(())
                }),
            )
            .await?;
        Ok(problem.hint)
    }

    /// Complete the match iff every slot has finished. Exactly one
    /// caller commits the transition and hands out awards; every other
    /// concurrent attempt returns false.
    pub async fn finalize_if_complete(&self, match_id: MatchId) -> AppResult<bool> {
        let now = self.clock.now();
        let result = self
            .matches
            .update(
                match_id,
                Box::new(move |m| {
                    if m.status == MatchStatus::Completed {
                        return Err(ArenaError::Conflict("Match already completed".into()));
                    }
                    if !m.all_completed() {
                        return Err(ArenaError::Conflict("Race still in progress".into()));
                    }
                    // Matchmade 1v1s are decided by the clock; lobby
                    // races by score.
                    let head_to_head = m.game_id.is_none() && m.players.len() == 2;
                    let mut order: Vec<usize> = (0..m.players.len()).collect();
                    order.sort_by(|&a, &b| {
                        let (pa, pb) = (&m.players[a], &m.players[b]);
                        let by_score = pb.score.cmp(&pa.score);
                        let by_time = pa
                            .time_elapsed
                            .partial_cmp(&pb.time_elapsed)
                            .unwrap_or(Ordering::Equal);
                        if head_to_head {
                            by_time.then(by_score)
                        } else {
                            by_score.then(by_time)
                        }
                    });
                    for (position, &i) in order.iter().enumerate() {
                        m.players[i].rank = Some(position as u32 + 1);
                    }
                    m.winners = order
                        .iter()
                        .take(3)
                        .map(|&i| m.players[i].user_id.clone())
                        .collect();
                    m.winner_id = m.winners.first().cloned();
                    m.status = MatchStatus::Completed;
                    m.completed_at = Some(now);
                    Ok(())
                }),
            )
            .await;

        let completed = match result {
            Ok(m) => m,
            Err(ArenaError::Conflict(_)) => return Ok(false),
            Err(err) => return Err(err),
        };
        self.timers.cancel(match_id, TimerKind::BotAssign);
        self.timers.cancel(match_id, TimerKind::BotComplete);
        self.award(&completed).await?;
        tracing::info!(
            match_id = %match_id,
            winner = completed.winner_id.as_deref().unwrap_or(""),
            "Match finalized"
        );
        Ok(true)
    }

    /// Rating and XP payouts for a freshly completed match. Matchmade
    /// two-slot matches use symmetric ELO; lobby matches use the podium
    /// table. Bot slots never touch the player store.
    async fn award(&self, m: &Match) -> AppResult<()> {
        if m.game_id.is_none() && m.players.len() == 2 {
            return self.award_head_to_head(m).await;
        }
        for slot in &m.players {
            if slot.is_bot {
                continue;
            }
            let Some(rank) = slot.rank else { continue };
            if let Some((xp, rating)) = podium_awards(rank) {
                self.players.adjust_xp(&slot.user_id, xp).await?;
                self.players
                    .adjust_rating(&slot.user_id, rating, self.config.rating_floor)
                    .await?;
                tracing::debug!(user_id = %slot.user_id, rank, xp, rating, "Podium award");
            }
        }
        Ok(())
    }

    async fn award_head_to_head(&self, m: &Match) -> AppResult<()> {
        let winner = m.players.iter().find(|p| p.rank == Some(1));
        let loser = m.players.iter().find(|p| p.rank == Some(2));
        let (Some(winner), Some(loser)) = (winner, loser) else {
            return Ok(());
        };

        let winner_rating = self.slot_rating(winner).await;
        let loser_rating = self.slot_rating(loser).await;
        let delta = rating_change(winner_rating, loser_rating, winner.used_hints);

        if !winner.is_bot {
            self.players
                .adjust_rating(&winner.user_id, delta, self.config.rating_floor)
                .await?;
            let xp = xp_bonus(winner.time_elapsed, m.time_limit_seconds, winner.used_hints);
            self.players.adjust_xp(&winner.user_id, xp).await?;
        }
        if !loser.is_bot {
            self.players
                .adjust_rating(&loser.user_id, -delta, self.config.rating_floor)
                .await?;
        }
        tracing::debug!(
            match_id = %m.id,
            winner = %winner.user_id,
            delta,
            "Head-to-head ratings adjusted"
        );
        Ok(())
    }

    async fn slot_rating(&self, slot: &PlayerSlot) -> i64 {
        if slot.is_bot {
            return slot.bot_rating.unwrap_or(DEFAULT_RATING);
        }
        self.players
            .get(&slot.user_id)
            .await
            .map(|p| p.rating)
            .unwrap_or(DEFAULT_RATING)
    }

    pub async fn leaderboard(&self, limit: usize) -> AppResult<Vec<colosseum_common::PlayerProfile>> {
        self.players.top_by_rating(limit).await
    }

    // ----- internals -----

    /// Race problems on the easy-to-hard ladder, deduplicated, drawn
    /// from the store with the generator as fallback. A failing
    /// generator never blocks creation: the race degrades to repeat
    /// pool picks, then to the static catalog.
    async fn select_race(&self, mode: GameMode) -> AppResult<Vec<Problem>> {
        let pool = self.problems.list_for_mode(mode.problem_pool()).await?;
        let mut race: Vec<Problem> = Vec::with_capacity(self.config.race_size);
        let mut used: Vec<ProblemId> = Vec::new();

        for i in 0..self.config.race_size {
            let difficulty = DIFFICULTY_LADDER[i.min(DIFFICULTY_LADDER.len() - 1)];
            let mut problem = match pick_from_pool(&pool, difficulty, &used) {
                Some(p) => p,
                None => match self.generator.generate_problem(mode, difficulty).await {
                    Ok(generated) => {
                        self.problems.insert(generated.clone()).await?;
                        generated
                    }
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            %mode,
                            "Problem generator unavailable; falling back to the static catalog"
                        );
                        match pick_from_pool(&pool, difficulty, &[]) {
                            Some(p) => p,
                            None => {
                                let fallback =
                                    StaticPool::new().generate_problem(mode, difficulty).await?;
                                self.problems.insert(fallback.clone()).await?;
                                fallback
                            }
                        }
                    }
                },
            };
            if problem.mode == GameMode::CodeQuiz && problem.quiz_questions.is_empty() {
                match self
                    .generator
                    .generate_quiz_questions(Language::Python, QUIZ_QUESTION_COUNT)
                    .await
                {
                    Ok(questions) => {
                        problem.quiz_questions = questions;
                        self.problems.insert(problem.clone()).await?;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Quiz question bank unavailable");
                    }
                }
            }
            used.push(problem.id);
            race.push(problem);
        }
        Ok(race)
    }

    async fn mint_lobby_code(&self) -> AppResult<String> {
        for _ in 0..self.config.lobby_code_retries {
            let code: String = {
                use rand::Rng;
                let mut rng = rand::rng();
                (0..self.config.lobby_code_len)
                    .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                    .collect()
            };
            if !self.lobbies.code_exists(&code).await? {
                return Ok(code);
            }
        }
        Err(ArenaError::Internal(
            "Could not mint a unique lobby code".into(),
        ))
    }
}

/// Wrong-order / broken-code artifacts seeded once per lobby or match
/// from its first problem, so every participant sees the same puzzle
fn mode_artifacts(
    mode: GameMode,
    first_problem: Option<&Problem>,
) -> (Option<String>, Option<Vec<String>>) {
    let Some(problem) = first_problem else {
        return (None, None);
    };
    let reference = problem.reference_code.get(&Language::Python);
    match mode {
        GameMode::BugHunt => {
            let buggy = problem
                .buggy_code
                .get(&Language::Python)
                .cloned()
                .or_else(|| reference.map(|r| generate_buggy_code(r, Language::Python)));
            (buggy, None)
        }
        GameMode::CodeShuffle => (None, reference.map(|r| shuffle_code(r))),
        _ => (None, None),
    }
}

fn pick_from_pool(pool: &[Problem], difficulty: Difficulty, used: &[ProblemId]) -> Option<Problem> {
    use rand::seq::IndexedRandom;
    let mut rng = rand::rng();
    let exact: Vec<&Problem> = pool
        .iter()
        .filter(|p| p.difficulty == difficulty && !used.contains(&p.id))
        .collect();
    if let Some(p) = exact.choose(&mut rng) {
        return Some((*p).clone());
    }
    // Relax difficulty before falling back to the generator
    let any: Vec<&Problem> = pool.iter().filter(|p| !used.contains(&p.id)).collect();
    any.choose(&mut rng).map(|p| (*p).clone())
}
