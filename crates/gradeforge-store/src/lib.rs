//! gradeforge-store — In-memory gradebook storage.
//!
//! Implements the `GradebookStore` contract over read-write locked maps,
//! with referential integrity checks on submission writes.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use gradeforge_core::analytics::AssignmentAnalytics;
use gradeforge_core::error::StoreError;
use gradeforge_core::model::{Answer, Assignment, Submission, SubmissionStatus, User};
use gradeforge_core::traits::GradebookStore;

/// In-memory store for single-process runs.
///
/// Reads return clones, so previously fetched values never observe later
/// writes. Multi-row queries are sorted by submission time then id, which
/// keeps aggregation output stable across identical runs.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    assignments: RwLock<HashMap<Uuid, Assignment>>,
    submissions: RwLock<HashMap<Uuid, Submission>>,
    analytics: RwLock<HashMap<Uuid, AssignmentAnalytics>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_time(mut rows: Vec<Submission>) -> Vec<Submission> {
    rows.sort_by_key(|s| (s.submitted_at, s.id));
    rows
}

#[async_trait]
impl GradebookStore for MemoryStore {
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        Ok(self.assignments.read().unwrap().get(&id).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().unwrap();
        if users.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists {
                entity: "user",
                id: user.id,
            });
        }
        debug!(user_id = %user.id, role = ?user.role, "user stored");
        users.insert(user.id, user);
        Ok(())
    }

    async fn insert_assignment(&self, assignment: Assignment) -> Result<(), StoreError> {
        let mut assignments = self.assignments.write().unwrap();
        if assignments.contains_key(&assignment.id) {
            return Err(StoreError::AlreadyExists {
                entity: "assignment",
                id: assignment.id,
            });
        }
        debug!(assignment_id = %assignment.id, questions = assignment.questions.len(), "assignment stored");
        assignments.insert(assignment.id, assignment);
        Ok(())
    }

    async fn insert_submission(&self, submission: Submission) -> Result<(), StoreError> {
        if !self.users.read().unwrap().contains_key(&submission.student_id) {
            return Err(StoreError::Missing {
                entity: "user",
                id: submission.student_id,
            });
        }
        if !self
            .assignments
            .read()
            .unwrap()
            .contains_key(&submission.assignment_id)
        {
            return Err(StoreError::Missing {
                entity: "assignment",
                id: submission.assignment_id,
            });
        }

        let mut submissions = self.submissions.write().unwrap();
        if submissions.contains_key(&submission.id) {
            return Err(StoreError::AlreadyExists {
                entity: "submission",
                id: submission.id,
            });
        }
        debug!(
            submission_id = %submission.id,
            answers = submission.answers.len(),
            "submission stored"
        );
        submissions.insert(submission.id, submission);
        Ok(())
    }

    async fn submissions_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let rows: Vec<Submission> = self
            .submissions
            .read()
            .unwrap()
            .values()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect();
        Ok(sorted_by_time(rows))
    }

    async fn submissions_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let rows: Vec<Submission> = self
            .submissions
            .read()
            .unwrap()
            .values()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect();
        Ok(sorted_by_time(rows))
    }

    async fn answers_for_question(&self, question_id: Uuid) -> Result<Vec<Answer>, StoreError> {
        let submitted: Vec<Submission> = self
            .submissions
            .read()
            .unwrap()
            .values()
            .filter(|s| s.status >= SubmissionStatus::Submitted)
            .cloned()
            .collect();

        Ok(sorted_by_time(submitted)
            .into_iter()
            .flat_map(|s| s.answers)
            .filter(|a| a.question_id == question_id)
            .collect())
    }

    async fn upsert_analytics(&self, analytics: AssignmentAnalytics) -> Result<(), StoreError> {
        debug!(assignment_id = %analytics.assignment_id, "analytics upserted");
        self.analytics
            .write()
            .unwrap()
            .insert(analytics.assignment_id, analytics);
        Ok(())
    }

    async fn analytics(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentAnalytics>, StoreError> {
        Ok(self.analytics.read().unwrap().get(&assignment_id).cloned())
    }
}
