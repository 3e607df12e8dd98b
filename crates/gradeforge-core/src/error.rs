//! Error types for the grading and analytics engine.
//!
//! `EvaluatorError` is defined in `gradeforge-core` so the answer grader can
//! classify evaluator failures for degradation decisions without string
//! matching.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by grading, aggregation, and report operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The referenced assignment does not exist.
    #[error("assignment {0} not found")]
    AssignmentNotFound(Uuid),

    /// The referenced user does not exist.
    #[error("user {0} not found")]
    UserNotFound(Uuid),

    /// An academic report was requested for a user that is not a student.
    #[error("user {0} is not a student")]
    NotAStudent(Uuid),

    /// A repeat submission arrived while single-attempt policy is in force.
    #[error("student {student_id} already submitted assignment {assignment_id}")]
    DuplicateSubmission {
        student_id: Uuid,
        assignment_id: Uuid,
    },

    /// The persistence store rejected or failed an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by [`GradebookStore`](crate::traits::GradebookStore)
/// implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert collided with an existing record.
    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: Uuid },

    /// A write referenced a record that does not exist.
    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: Uuid },
}

/// Errors that can occur when calling an answer-quality evaluator.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The evaluator replied with something that is not a usable verdict.
    #[error("malformed verdict: {0}")]
    MalformedVerdict(String),
}

impl EvaluatorError {
    /// Returns `true` if this error is permanent and retrying is pointless.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            EvaluatorError::AuthenticationFailed(_) | EvaluatorError::MalformedVerdict(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            EvaluatorError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
