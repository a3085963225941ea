//! Legacy 1v1 match shape.
//!
//! Early matches persisted two named slots (`player1`, `player2`) instead
//! of a players list. The engine never branches on this: conversion here
//! normalizes to the internal list-of-slots [`Match`] on the way in and
//! re-projects on the way out for old clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GameMode, Match, MatchStatus, PlayerId, PlayerSlot, ProblemId};

/// Two-named-slot serialization of a 1v1 match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyMatch {
    pub id: crate::types::MatchId,
    pub game_mode: GameMode,
    pub problem_ids: Vec<ProblemId>,
    pub total_problems: usize,
    #[serde(default)]
    pub buggy_code: Option<String>,
    pub player1: PlayerSlot,
    /// Empty until an opponent (human or bot) fills the slot
    #[serde(default)]
    pub player2: Option<PlayerSlot>,
    pub time_limit_seconds: u64,
    pub status: MatchStatus,
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<LegacyMatch> for Match {
    fn from(legacy: LegacyMatch) -> Self {
        let mut players = vec![legacy.player1];
        if let Some(p2) = legacy.player2 {
            players.push(p2);
        }
        Match {
            id: legacy.id,
            game_id: None,
            game_mode: legacy.game_mode,
            problem_ids: legacy.problem_ids,
            total_problems: legacy.total_problems,
            buggy_code: legacy.buggy_code,
            shuffled_lines: None,
            host_id: None,
            max_players: 2,
            players,
            time_limit_seconds: legacy.time_limit_seconds,
            status: legacy.status,
            winner_id: legacy.winner_id,
            winners: Vec::new(),
            created_at: legacy.created_at,
            started_at: legacy.started_at,
            completed_at: legacy.completed_at,
        }
    }
}

impl TryFrom<Match> for LegacyMatch {
    type Error = crate::error::ArenaError;

    fn try_from(m: Match) -> Result<Self, Self::Error> {
        if m.players.len() > 2 {
            return Err(crate::error::ArenaError::Validation(format!(
                "Match {} has {} players; the legacy shape holds exactly 1 or 2",
                m.id,
                m.players.len()
            )));
        }
        let mut players = m.players.into_iter();
        let Some(player1) = players.next() else {
            return Err(crate::error::ArenaError::Validation(format!(
                "Match {} has no players; the legacy shape holds exactly 1 or 2",
                m.id
            )));
        };
        Ok(LegacyMatch {
            id: m.id,
            game_mode: m.game_mode,
            problem_ids: m.problem_ids,
            total_problems: m.total_problems,
            buggy_code: m.buggy_code,
            player1,
            player2: players.next(),
            time_limit_seconds: m.time_limit_seconds,
            status: m.status,
            winner_id: m.winner_id,
            created_at: m.created_at,
            started_at: m.started_at,
            completed_at: m.completed_at,
        })
    }
}
