//! Store traits and the in-memory reference implementation.
//!
//! Every match and lobby mutation is a conditional atomic
//! read-modify-write: the caller's closure runs under the store's write
//! lock and may reject the update by returning an error, in which case
//! nothing is persisted. That is the whole concurrency story of the
//! engine; there are no other locks.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use colosseum_common::{
    AppResult, ArenaError, GameMode, Lobby, LobbyId, Match, MatchId, MatchStatus, PlayerId,
    PlayerProfile, Problem, ProblemId,
};

/// Rating a player starts with before any rated match
pub const DEFAULT_RATING: i64 = 1000;

pub type MatchUpdate = Box<dyn FnOnce(&mut Match) -> AppResult<()> + Send>;
pub type LobbyUpdate = Box<dyn FnOnce(&mut Lobby) -> AppResult<()> + Send>;

/// Read-mostly catalog of puzzle definitions
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn insert(&self, problem: Problem) -> AppResult<()>;
    async fn get(&self, id: ProblemId) -> AppResult<Problem>;
    /// Problems seeded for the given pool mode
    async fn list_for_mode(&self, mode: GameMode) -> AppResult<Vec<Problem>>;
}

/// Player rating and XP ledger
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn get(&self, id: &str) -> AppResult<PlayerProfile>;
    /// Fetch a profile, creating a default-rated one on first sight
    async fn get_or_create(&self, id: &str, username: &str) -> AppResult<PlayerProfile>;
    /// Atomic rating delta. The result never drops below `floor`;
    /// returns the rating after the adjustment.
    async fn adjust_rating(&self, id: &str, delta: i64, floor: i64) -> AppResult<i64>;
    /// Atomic XP delta; returns the XP after the adjustment
    async fn adjust_xp(&self, id: &str, delta: i64) -> AppResult<i64>;
    /// Top players ordered by rating descending
    async fn top_by_rating(&self, limit: usize) -> AppResult<Vec<PlayerProfile>>;
}

/// Waiting-room state
#[async_trait]
pub trait LobbyStore: Send + Sync {
    async fn insert(&self, lobby: Lobby) -> AppResult<()>;
    async fn get(&self, id: LobbyId) -> AppResult<Lobby>;
    async fn get_by_code(&self, code: &str) -> AppResult<Lobby>;
    async fn code_exists(&self, code: &str) -> AppResult<bool>;
    async fn list(
        &self,
        status: Option<MatchStatus>,
        mode: Option<GameMode>,
    ) -> AppResult<Vec<Lobby>>;
    /// Atomic read-modify-write. The update is persisted only when the
    /// closure returns Ok. A lobby left with zero players is removed;
    /// `None` is returned in that case.
    async fn update(&self, id: LobbyId, f: LobbyUpdate) -> AppResult<Option<Lobby>>;
}

/// Active and completed matches
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn insert(&self, m: Match) -> AppResult<()>;
    async fn get(&self, id: MatchId) -> AppResult<Match>;
    /// Oldest waiting match in the mode that the player is not already in
    async fn find_waiting(&self, mode: GameMode, exclude_player: &str)
    -> AppResult<Option<Match>>;
    /// Atomic read-modify-write; persisted only when the closure
    /// returns Ok, and the updated match is returned
    async fn update(&self, id: MatchId, f: MatchUpdate) -> AppResult<Match>;
}

/// In-memory store backing all four traits. Single-process only;
/// persistence proper lives behind the same traits.
#[derive(Default)]
pub struct MemoryStore {
    problems: RwLock<HashMap<ProblemId, Problem>>,
    players: RwLock<HashMap<PlayerId, PlayerProfile>>,
    lobbies: RwLock<HashMap<LobbyId, Lobby>>,
    matches: RwLock<HashMap<MatchId, Match>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn insert(&self, problem: Problem) -> AppResult<()> {
        self.problems.write().await.insert(problem.id, problem);
        Ok(())
    }

    async fn get(&self, id: ProblemId) -> AppResult<Problem> {
        self.problems
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(format!("Problem {id} not found")))
    }

    async fn list_for_mode(&self, mode: GameMode) -> AppResult<Vec<Problem>> {
        Ok(self
            .problems
            .read()
            .await
            .values()
            .filter(|p| p.mode == mode)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PlayerStore for MemoryStore {
    async fn get(&self, id: &str) -> AppResult<PlayerProfile> {
        self.players
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(format!("Player {id} not found")))
    }

    async fn get_or_create(&self, id: &str, username: &str) -> AppResult<PlayerProfile> {
        let mut players = self.players.write().await;
        let profile = players.entry(id.to_string()).or_insert_with(|| PlayerProfile {
            id: id.to_string(),
            username: username.to_string(),
            rating: DEFAULT_RATING,
            xp: 0,
        });
        Ok(profile.clone())
    }

    async fn adjust_rating(&self, id: &str, delta: i64, floor: i64) -> AppResult<i64> {
        let mut players = self.players.write().await;
        let profile = players
            .get_mut(id)
            .ok_or_else(|| ArenaError::NotFound(format!("Player {id} not found")))?;
        profile.rating = (profile.rating + delta).max(floor);
        Ok(profile.rating)
    }

    async fn adjust_xp(&self, id: &str, delta: i64) -> AppResult<i64> {
        let mut players = self.players.write().await;
        let profile = players
            .get_mut(id)
            .ok_or_else(|| ArenaError::NotFound(format!("Player {id} not found")))?;
        profile.xp += delta;
        Ok(profile.xp)
    }

    async fn top_by_rating(&self, limit: usize) -> AppResult<Vec<PlayerProfile>> {
        let players = self.players.read().await;
        let mut all: Vec<PlayerProfile> = players.values().cloned().collect();
        all.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.username.cmp(&b.username)));
        all.truncate(limit);
        Ok(all)
    }
}

#[async_trait]
impl LobbyStore for MemoryStore {
    async fn insert(&self, lobby: Lobby) -> AppResult<()> {
        self.lobbies.write().await.insert(lobby.id, lobby);
        Ok(())
    }

    async fn get(&self, id: LobbyId) -> AppResult<Lobby> {
        self.lobbies
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(format!("Lobby {id} not found")))
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Lobby> {
        self.lobbies
            .read()
            .await
            .values()
            .find(|l| l.game_id == code)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(format!("Lobby {code} not found")))
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        Ok(self
            .lobbies
            .read()
            .await
            .values()
            .any(|l| l.game_id == code))
    }

    async fn list(
        &self,
        status: Option<MatchStatus>,
        mode: Option<GameMode>,
    ) -> AppResult<Vec<Lobby>> {
        let lobbies = self.lobbies.read().await;
        let mut selected: Vec<Lobby> = lobbies
            .values()
            .filter(|l| status.is_none_or(|s| l.status == s))
            .filter(|l| mode.is_none_or(|m| l.game_mode == m))
            .cloned()
            .collect();
        selected.sort_by_key(|l| l.created_at);
        Ok(selected)
    }

    async fn update(&self, id: LobbyId, f: LobbyUpdate) -> AppResult<Option<Lobby>> {
        let mut lobbies = self.lobbies.write().await;
        let lobby = lobbies
            .get_mut(&id)
            .ok_or_else(|| ArenaError::NotFound(format!("Lobby {id} not found")))?;
        let mut candidate = lobby.clone();
        f(&mut candidate)?;
        if candidate.players.is_empty() {
            lobbies.remove(&id);
            return Ok(None);
        }
        *lobby = candidate.clone();
        Ok(Some(candidate))
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert(&self, m: Match) -> AppResult<()> {
        self.matches.write().await.insert(m.id, m);
        Ok(())
    }

    async fn get(&self, id: MatchId) -> AppResult<Match> {
        self.matches
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(format!("Match {id} not found")))
    }

    async fn find_waiting(
        &self,
        mode: GameMode,
        exclude_player: &str,
    ) -> AppResult<Option<Match>> {
        let matches = self.matches.read().await;
        let mut waiting: Vec<&Match> = matches
            .values()
            .filter(|m| m.status == MatchStatus::Waiting && m.game_mode == mode)
            .filter(|m| m.player(exclude_player).is_none())
            .filter(|m| m.players.len() < m.max_players)
            .collect();
        waiting.sort_by_key(|m| m.created_at);
        Ok(waiting.first().map(|m| (*m).clone()))
    }

    async fn update(&self, id: MatchId, f: MatchUpdate) -> AppResult<Match> {
        let mut matches = self.matches.write().await;
        let entry = matches
            .get_mut(&id)
            .ok_or_else(|| ArenaError::NotFound(format!("Match {id} not found")))?;
        let mut candidate = entry.clone();
        f(&mut candidate)?;
        *entry = candidate.clone();
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn waiting_match(mode: GameMode, player: &str) -> Match {
        Match {
            id: Uuid::new_v4(),
            game_id: None,
            game_mode: mode,
            problem_ids: vec![Uuid::new_v4()],
            total_problems: 1,
            buggy_code: None,
            shuffled_lines: None,
            host_id: None,
            max_players: 2,
            players: vec![colosseum_common::PlayerSlot::new(player, player)],
            time_limit_seconds: 1500,
            status: MatchStatus::Waiting,
            winner_id: None,
            winners: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_update_rejected_by_closure_persists_nothing() {
        let store = MemoryStore::new();
        let m = waiting_match(GameMode::Standard, "alice");
        let id = m.id;
        MatchStore::insert(&store, m).await.unwrap();

        let result = MatchStore::update(
            &store,
                id,
                Box::new(|m| {
                    m.status = MatchStatus::Completed;
                    Err(ArenaError::Conflict("nope".into()))
                }),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(
            MatchStore::get(&store, id).await.unwrap().status,
            MatchStatus::Waiting
        );
    }

    #[tokio::test]
    async fn test_find_waiting_excludes_own_match() {
        let store = MemoryStore::new();
        let m = waiting_match(GameMode::Standard, "alice");
        MatchStore::insert(&store, m).await.unwrap();

        let found = store.find_waiting(GameMode::Standard, "alice").await.unwrap();
        assert!(found.is_none());
        let found = store.find_waiting(GameMode::Standard, "bob").await.unwrap();
        assert!(found.is_some());
        let found = store.find_waiting(GameMode::BugHunt, "bob").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_rating_floor_holds() {
        let store = MemoryStore::new();
        store.get_or_create("alice", "alice").await.unwrap();
        let rating = store.adjust_rating("alice", -5000, 0).await.unwrap();
        assert_eq!(rating, 0);
        let rating = store.adjust_rating("alice", 26, 0).await.unwrap();
        assert_eq!(rating, 26);
    }

    #[tokio::test]
    async fn test_emptied_lobby_is_removed() {
        let store = MemoryStore::new();
        let lobby = Lobby {
            id: Uuid::new_v4(),
            game_id: "ABC123".into(),
            lobby_name: "test".into(),
            host_id: "alice".into(),
            host_username: "alice".into(),
            game_mode: GameMode::Standard,
            problem_ids: Vec::new(),
            total_problems: 0,
            time_limit_seconds: 1500,
            max_players: 4,
            players: vec![colosseum_common::PlayerSlot::new("alice", "alice")],
            buggy_code: None,
            shuffled_lines: None,
            status: MatchStatus::Waiting,
            match_id: None,
            created_at: Utc::now(),
            started_at: None,
        };
        let id = lobby.id;
        LobbyStore::insert(&store, lobby).await.unwrap();

        let after = LobbyStore::update(
            &store,
                id,
                Box::new(|l| {
                    l.players.clear();
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert!(after.is_none());
        assert!(LobbyStore::get(&store, id).await.is_err());
    }
}
