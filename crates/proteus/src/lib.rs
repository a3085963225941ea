//! Code mutation engine: pure transformations over source text.
//!
//! Both transformations take an explicit random source so tests can seed
//! them; production call sites draw fresh randomness through the
//! `*_code` wrappers.

pub mod bugs;
pub mod shuffle;

pub use bugs::{generate_buggy_code, inject_bugs};
pub use shuffle::{shuffle_code, shuffle_lines};
