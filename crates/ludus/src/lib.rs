//! Match engine: lobby lifecycle, matchmaking, bot opponents, submission
//! handling and finalization.
//!
//! The engine is a library of operations over store traits; it owns no
//! transport. Every match mutation goes through a conditional atomic
//! read-modify-write on the store, so two racing callers (a human
//! submission and a bot timer, say) converge on one finalization.

pub mod bot;
pub mod clock;
pub mod config;
pub mod engine;
pub mod generator;
pub mod store;
pub mod timers;

pub use clock::{Clock, SystemClock};
pub use config::EngineConfig;
pub use engine::{MatchEngine, SubmitOutcome};
pub use generator::{ProblemGenerator, StaticPool};
pub use store::{LobbyStore, MatchStore, MemoryStore, PlayerStore, ProblemStore};
pub use timers::{TimerKind, TimerRegistry};
