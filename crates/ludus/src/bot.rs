//! Synthetic opponents for 1v1 matchmaking.
//!
//! A bot is a name, a rating near the requester's, and a completion
//! delay derived from that rating. Higher-rated bots finish sooner.

use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;

/// Fixed pool of bot display names
pub const BOT_NAMES: &[&str] = &[
    "CodeBot",
    "AlgoMaster",
    "PyThonBot",
    "JavaJedi",
    "CppNinja",
    "RustRacer",
    "GoGopher",
];

/// Pick a display name for a fresh bot
pub fn pick_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    // The pool is non-empty, so choose cannot fail
    BOT_NAMES.choose(rng).copied().unwrap_or("CodeBot")
}

/// Bot rating: the requester's rating with up to +-100 jitter
pub fn rating_near<R: Rng + ?Sized>(requester_rating: i64, rng: &mut R) -> i64 {
    requester_rating + rng.random_range(-100..=100)
}

/// Fraction of the base solve time this skill level needs.
///
/// 1000-rated bots take the full base time; each rating point above
/// shaves time off, floored at 30% of the base.
pub fn skill_factor(rating: i64) -> f64 {
    (1.0 - (rating as f64 - 1000.0) / 1000.0).clamp(0.3, 1.0)
}

/// How long the bot "solves" before its completion timer fires
pub fn completion_delay<R: Rng + ?Sized>(rating: i64, base_secs: u64, rng: &mut R) -> Duration {
    let secs = base_secs as f64 * skill_factor(rating) * rng.random_range(0.5..1.0);
    Duration::from_secs_f64(secs)
}
