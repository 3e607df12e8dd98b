//! Shared in-memory fixtures for core unit tests.
//!
//! `TestStore` is a minimal `GradebookStore` double; the production
//! implementation with integrity checks lives in `gradeforge-store`.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::analytics::AssignmentAnalytics;
use crate::error::{EvaluatorError, StoreError};
use crate::model::{Answer, Assignment, Submission, SubmissionStatus, User};
use crate::traits::{AnswerEvaluator, EvaluateRequest, EvaluatorVerdict, GradebookStore};

#[derive(Default)]
pub(crate) struct TestStore {
    pub users: Mutex<Vec<User>>,
    pub assignments: Mutex<Vec<Assignment>>,
    pub submissions: Mutex<Vec<Submission>>,
    pub analytics: Mutex<Vec<AssignmentAnalytics>>,
}

impl TestStore {
    pub fn with_assignment(assignment: Assignment) -> Self {
        let store = Self::default();
        store.assignments.lock().unwrap().push(assignment);
        store
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_assignment(&self, assignment: Assignment) {
        self.assignments.lock().unwrap().push(assignment);
    }

    pub fn add_submission(&self, submission: Submission) {
        self.submissions.lock().unwrap().push(submission);
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl GradebookStore for TestStore {
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.users.lock().unwrap().push(user);
        Ok(())
    }

    async fn insert_assignment(&self, assignment: Assignment) -> Result<(), StoreError> {
        self.assignments.lock().unwrap().push(assignment);
        Ok(())
    }

    async fn insert_submission(&self, submission: Submission) -> Result<(), StoreError> {
        self.submissions.lock().unwrap().push(submission);
        Ok(())
    }

    async fn submissions_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<Submission> = self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.submitted_at, s.id));
        Ok(rows)
    }

    async fn submissions_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<Submission> = self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.submitted_at, s.id));
        Ok(rows)
    }

    async fn answers_for_question(&self, question_id: Uuid) -> Result<Vec<Answer>, StoreError> {
        let mut rows: Vec<(chrono::DateTime<chrono::Utc>, Uuid, Answer)> = Vec::new();
        for submission in self.submissions.lock().unwrap().iter() {
            if submission.status < SubmissionStatus::Submitted {
                continue;
            }
            for answer in &submission.answers {
                if answer.question_id == question_id {
                    rows.push((submission.submitted_at, submission.id, answer.clone()));
                }
            }
        }
        rows.sort_by_key(|(at, id, _)| (*at, *id));
        Ok(rows.into_iter().map(|(_, _, a)| a).collect())
    }

    async fn upsert_analytics(&self, analytics: AssignmentAnalytics) -> Result<(), StoreError> {
        let mut rows = self.analytics.lock().unwrap();
        rows.retain(|a| a.assignment_id != analytics.assignment_id);
        rows.push(analytics);
        Ok(())
    }

    async fn analytics(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentAnalytics>, StoreError> {
        Ok(self
            .analytics
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.assignment_id == assignment_id)
            .cloned())
    }
}

/// Evaluator double: awards a fixed mark, or fails when `marks` is `None`.
pub(crate) struct FixedEvaluator {
    pub marks: Option<u32>,
}

#[async_trait]
impl AnswerEvaluator for FixedEvaluator {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn evaluate(
        &self,
        _request: &EvaluateRequest,
    ) -> Result<EvaluatorVerdict, EvaluatorError> {
        match self.marks {
            Some(marks) => Ok(EvaluatorVerdict {
                marks_awarded: marks,
                feedback: "Scored by fixture.".to_string(),
                confidence: 0.9,
            }),
            None => Err(EvaluatorError::Network("fixture outage".to_string())),
        }
    }
}
