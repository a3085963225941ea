//! Shared types and errors for the Colosseum arena services.

pub mod error;
pub mod legacy;
pub mod types;

pub use error::{AppResult, ArenaError};
pub use types::*;
