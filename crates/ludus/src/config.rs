//! Configuration for the match engine

use std::env;

/// Engine configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lower bound on a lobby's player cap
    pub min_players: usize,

    /// Upper bound on a lobby's player cap
    pub max_players: usize,

    /// Problems per race
    pub race_size: usize,

    /// Length of the shareable lobby code
    pub lobby_code_len: usize,

    /// Collision retries when minting a lobby code
    pub lobby_code_retries: usize,

    /// Default per-match time limit in seconds
    pub default_time_limit_secs: u64,

    /// How long a 1v1 matchmaking slot waits for a human before a bot
    /// is attached
    pub bot_grace_secs: u64,

    /// Base solve time a bot's skill factor scales down from
    pub bot_base_secs: u64,

    /// Ratings never drop below this
    pub rating_floor: i64,
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            min_players: 2,
            max_players: env::var("ENGINE_MAX_PLAYERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            race_size: env::var("ENGINE_RACE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            lobby_code_len: 6,
            lobby_code_retries: 10,
            default_time_limit_secs: env::var("ENGINE_DEFAULT_TIME_LIMIT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1500),
            bot_grace_secs: env::var("ENGINE_BOT_GRACE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            bot_base_secs: env::var("ENGINE_BOT_BASE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            rating_floor: env::var("ENGINE_RATING_FLOOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_defaults() {
        let config = EngineConfig::from_env();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.race_size, 5);
        assert_eq!(config.lobby_code_len, 6);
    }
}
