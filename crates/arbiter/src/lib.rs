//! Mode evaluators and scoring for the arena.
//!
//! One evaluator per game mode behind a single uniform entry point, plus
//! the pure scoring/rating functions used at match finalization.

pub mod evaluate;
pub mod scoring;
pub mod verdict;

pub use evaluate::{Submission, evaluate};
pub use verdict::{EvalArtifacts, Verdict};
