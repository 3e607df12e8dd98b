//! Collaborator contracts for the grading engine.
//!
//! These async traits are implemented by the `gradeforge-store` and
//! `gradeforge-evaluators` crates respectively.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::AssignmentAnalytics;
use crate::error::{EvaluatorError, StoreError};
use crate::model::{Answer, Assignment, Submission, User};

// ---------------------------------------------------------------------------
// Gradebook store trait
// ---------------------------------------------------------------------------

/// Transactional persistence contract for the grading engine.
///
/// Implementations must keep each write atomic: `insert_submission` persists
/// a submission together with all of its answers and its evaluation, or
/// nothing at all, and `upsert_analytics` is last-writer-wins with no partial
/// interleaving. Multi-row query results are ordered by submission time, then
/// id, so aggregation output is deterministic.
#[async_trait]
pub trait GradebookStore: Send + Sync {
    /// Fetch a user by id.
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fetch an assignment, including its questions.
    async fn assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError>;

    /// Insert a new user. Fails with `AlreadyExists` on id collision.
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;

    /// Insert a new assignment. Fails with `AlreadyExists` on id collision.
    async fn insert_assignment(&self, assignment: Assignment) -> Result<(), StoreError>;

    /// Atomically persist a submission with its answers and evaluation.
    /// Fails with `Missing` if the referenced assignment or student does not
    /// exist.
    async fn insert_submission(&self, submission: Submission) -> Result<(), StoreError>;

    /// All submissions for an assignment, any status.
    async fn submissions_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError>;

    /// All submissions made by a student.
    async fn submissions_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError>;

    /// All answers to a question, drawn from submitted-or-later submissions.
    async fn answers_for_question(&self, question_id: Uuid) -> Result<Vec<Answer>, StoreError>;

    /// Overwrite (or create) the analytics record for an assignment.
    async fn upsert_analytics(&self, analytics: AssignmentAnalytics) -> Result<(), StoreError>;

    /// Fetch the stored analytics record for an assignment, if any.
    async fn analytics(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentAnalytics>, StoreError>;
}

// ---------------------------------------------------------------------------
// Answer evaluator trait
// ---------------------------------------------------------------------------

/// Trait for answer-quality evaluators that score free-text responses.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    /// Human-readable evaluator name (e.g. "heuristic").
    fn name(&self) -> &str;

    /// Score one response against a question.
    async fn evaluate(&self, request: &EvaluateRequest)
        -> Result<EvaluatorVerdict, EvaluatorError>;
}

/// Request to score one free-text response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// The question prompt the response addresses.
    pub question_text: String,
    /// The student's response.
    pub response_text: String,
    /// Maximum marks awardable.
    pub max_marks: u32,
}

/// An evaluator's scoring decision for one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorVerdict {
    /// Marks the evaluator proposes; the grader clamps into `[0, max_marks]`.
    pub marks_awarded: u32,
    /// Feedback for the student.
    pub feedback: String,
    /// Evaluator self-reported confidence in `[0, 1]`.
    pub confidence: f64,
}
