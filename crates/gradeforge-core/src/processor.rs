//! Submission intake and grading orchestration.
//!
//! Drives the `draft/absent → submitted → evaluated` lifecycle: intake marks
//! a submission `Submitted`, grading every supplied answer synchronously
//! moves it to `Evaluated`, and the finished submission is persisted through
//! a single atomic store call so partial grading is never visible.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreError;
use crate::grader::AnswerGrader;
use crate::model::{Answer, Evaluation, GradedBy, Submission, SubmissionStatus};
use crate::traits::{AnswerEvaluator, GradebookStore};

/// Whether a student may submit an assignment more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptPolicy {
    /// Reject a second submission for the same (student, assignment) pair.
    Single,
    /// Every submission starts a fresh attempt; all attempts are kept and
    /// all of them count toward assignment metrics.
    Multiple,
}

/// Configuration for the submission processor, passed at construction.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Overall feedback note recorded on every automatic evaluation.
    pub completion_note: String,
    /// Whether repeat submissions for the same assignment are accepted.
    pub attempt_policy: AttemptPolicy,
    /// Maximum submissions graded concurrently by `process_batch`.
    pub parallelism: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            completion_note: "Automatic evaluation completed.".to_string(),
            attempt_policy: AttemptPolicy::Multiple,
            parallelism: 4,
        }
    }
}

/// One submission to process: a student's raw answers keyed by question id.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub answers: HashMap<Uuid, Value>,
}

/// Orchestrates grading of whole submissions.
pub struct SubmissionProcessor {
    store: Arc<dyn GradebookStore>,
    grader: AnswerGrader,
    config: ProcessorConfig,
}

impl SubmissionProcessor {
    pub fn new(
        store: Arc<dyn GradebookStore>,
        evaluator: Arc<dyn AnswerEvaluator>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            grader: AnswerGrader::new(evaluator),
            config,
        }
    }

    /// Grade and persist one submission, returning it fully populated.
    ///
    /// Answers naming a question id the assignment does not contain are
    /// dropped rather than aborting the submission. Nothing is written to
    /// the store until every answer is graded.
    pub async fn process(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        answers: HashMap<Uuid, Value>,
    ) -> Result<Submission, CoreError> {
        let assignment = self
            .store
            .assignment(assignment_id)
            .await?
            .ok_or(CoreError::AssignmentNotFound(assignment_id))?;

        if self.config.attempt_policy == AttemptPolicy::Single {
            let prior = self.store.submissions_for_student(student_id).await?;
            if prior.iter().any(|s| s.assignment_id == assignment_id) {
                return Err(CoreError::DuplicateSubmission {
                    student_id,
                    assignment_id,
                });
            }
        }

        let mut submission = Submission {
            id: Uuid::new_v4(),
            assignment_id,
            student_id,
            status: SubmissionStatus::Submitted,
            submitted_at: Utc::now(),
            answers: Vec::new(),
            evaluation: None,
        };

        // Grade in stored question order so totals and answer rows come out
        // deterministic regardless of the answer map's iteration order.
        for question in &assignment.questions {
            let Some(response) = answers.get(&question.id) else {
                continue;
            };
            let graded = self.grader.grade(question, response).await;
            submission.answers.push(Answer {
                id: Uuid::new_v4(),
                question_id: question.id,
                response: response.clone(),
                marks_awarded: graded.marks_awarded,
                feedback: graded.feedback,
            });
        }

        let dropped = answers.len() - submission.answers.len();
        if dropped > 0 {
            debug!(
                %assignment_id,
                dropped, "dropped answers referencing unknown question ids"
            );
        }

        let total_marks = submission.score();
        submission.evaluation = Some(Evaluation {
            graded_by: GradedBy::Automatic,
            total_marks,
            overall_feedback: self.config.completion_note.clone(),
            evaluated_at: Utc::now(),
        });
        submission.status = SubmissionStatus::Evaluated;

        self.store.insert_submission(submission.clone()).await?;
        info!(
            submission_id = %submission.id,
            %assignment_id,
            %student_id,
            total_marks,
            "submission evaluated"
        );
        Ok(submission)
    }

    /// Process many submissions concurrently, at most `config.parallelism`
    /// in flight at once. Results come back in request order.
    pub async fn process_batch(
        &self,
        requests: Vec<SubmissionRequest>,
    ) -> Vec<Result<Submission, CoreError>> {
        stream::iter(requests)
            .map(|r| self.process(r.assignment_id, r.student_id, r.answers))
            .buffered(self.config.parallelism.max(1))
            .collect()
            .await
    }
}
