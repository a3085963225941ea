//! Application error types for Colosseum services.

use thiserror::Error;

/// Main application error type used across all arena services.
#[derive(Error, Debug)]
pub enum ArenaError {
    /// Request validation failed (bad player cap, duplicate join, lobby full)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found (unknown lobby/match/problem)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Action invalid for current status (starting an active lobby, double submit)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Submission ran but failed the test cases or quality bar.
    /// Always carries a human-readable reason; not a system error.
    #[error("{0}")]
    EvaluationRejected(String),

    /// Sandbox timeout or crash; evaluators treat it like a failing test case
    #[error("Execution failure: {0}")]
    ExecutionFailure(String),

    /// External problem/quiz generator failed; callers fall back to the static pool
    #[error("Generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// Persistence layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArenaError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ArenaError::Validation(_) => 422,
            ArenaError::NotFound(_) => 404,
            ArenaError::Conflict(_) => 409,
            ArenaError::EvaluationRejected(_) => 400,
            ArenaError::ExecutionFailure(_) => 400,
            ArenaError::GeneratorUnavailable(_) => 502,
            ArenaError::Storage(_) => 500,
            ArenaError::Internal(_) => 500,
        }
    }

    /// Returns the error code string for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ArenaError::Validation(_) => "VALIDATION_ERROR",
            ArenaError::NotFound(_) => "NOT_FOUND",
            ArenaError::Conflict(_) => "CONFLICT",
            ArenaError::EvaluationRejected(_) => "EVALUATION_REJECTED",
            ArenaError::ExecutionFailure(_) => "EXECUTION_FAILURE",
            ArenaError::GeneratorUnavailable(_) => "GENERATOR_UNAVAILABLE",
            ArenaError::Storage(_) => "STORAGE_ERROR",
            ArenaError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias using ArenaError
pub type AppResult<T> = Result<T, ArenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ArenaError::Validation("cap".into()).status_code(), 422);
        assert_eq!(ArenaError::NotFound("lobby".into()).status_code(), 404);
        assert_eq!(ArenaError::Conflict("started".into()).status_code(), 409);
        assert_eq!(
            ArenaError::EvaluationRejected("failed".into()).status_code(),
            400
        );
    }

    #[test]
    fn test_rejection_message_is_verbatim() {
        let err = ArenaError::EvaluationRejected("Code still has bugs!".into());
        assert_eq!(err.to_string(), "Code still has bugs!");
        assert_eq!(err.error_code(), "EVALUATION_REJECTED");
    }
}
