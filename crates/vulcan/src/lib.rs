//! Code execution sandbox.
//!
//! Runs one code snippet against one textual input as an isolated child
//! process under a hard wall-clock timeout. Best-effort isolation only:
//! the contract is a fresh temp file, a bounded subprocess and guaranteed
//! cleanup, not a secure multi-tenant sandbox.

pub mod config;
pub mod executor;
pub mod wrapper;

pub use config::SandboxConfig;
pub use executor::{BatchReport, CaseResult, ExecStatus, Execution, Executor, SyntaxReport};
