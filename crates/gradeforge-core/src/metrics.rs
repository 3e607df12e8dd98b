//! Assignment-level metrics aggregation.
//!
//! Pure read-then-compute over persisted submissions: nothing here mutates
//! grading results. All reported floats use a fixed precision of 2 decimal
//! places.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{Answer, Question, QuestionKind, SubmissionStatus};
use crate::traits::GradebookStore;

/// Round to the fixed reporting precision (2 decimal places).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Length at which question prompts are shortened in metrics output.
const PROMPT_EXCERPT_LEN: usize = 50;

/// Numeric statistics for one assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentMetrics {
    /// The assignment these metrics describe.
    pub assignment_id: Uuid,
    /// Number of submitted-or-later submissions observed.
    pub submission_count: usize,
    /// Arithmetic mean of per-submission scores.
    pub mean_score: f64,
    /// Highest per-submission score.
    pub max_score: f64,
    /// Lowest per-submission score.
    pub min_score: f64,
    /// Per-attempt totals, in submission order.
    pub student_scores: Vec<StudentScore>,
    /// Per-question statistics, in the assignment's question order.
    pub question_stats: Vec<QuestionStats>,
}

/// One student's total for one assignment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentScore {
    pub student_id: Uuid,
    pub score: u32,
}

/// Aggregate statistics for a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: Uuid,
    pub kind: QuestionKind,
    /// Prompt text, shortened for display when long.
    pub prompt_excerpt: String,
    /// Fraction of answers awarded full marks. For free-text questions this
    /// is the exact-full-credit rate, a known approximation: partial credit
    /// counts as not correct.
    pub correct_rate: f64,
    /// Mean marks awarded across all answers to this question.
    pub average_marks: f64,
}

impl QuestionStats {
    /// Compute stats for one question from its answers. A question nobody
    /// answered reports zeros rather than NaN so consumers stay total.
    pub fn compute(question: &Question, answers: &[Answer]) -> Self {
        let total = answers.len();
        let (correct_rate, average_marks) = if total == 0 {
            (0.0, 0.0)
        } else {
            let full_credit = answers
                .iter()
                .filter(|a| a.marks_awarded == question.marks)
                .count();
            let marks_sum: u32 = answers.iter().map(|a| a.marks_awarded).sum();
            (
                full_credit as f64 / total as f64,
                f64::from(marks_sum) / total as f64,
            )
        };

        Self {
            question_id: question.id,
            kind: question.kind,
            prompt_excerpt: excerpt(&question.prompt),
            correct_rate: round2(correct_rate),
            average_marks: round2(average_marks),
        }
    }
}

fn excerpt(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_EXCERPT_LEN {
        prompt.to_string()
    } else {
        let head: String = prompt.chars().take(PROMPT_EXCERPT_LEN).collect();
        format!("{head}...")
    }
}

/// Computes assignment metrics from the store.
pub struct MetricsAggregator {
    store: Arc<dyn GradebookStore>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn GradebookStore>) -> Self {
        Self { store }
    }

    /// Aggregate all submitted-or-later submissions of an assignment.
    ///
    /// Returns `Ok(None)` when the assignment has no such submissions; the
    /// caller must not conflate that with zero-valued metrics.
    pub async fn aggregate(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentMetrics>, CoreError> {
        let assignment = self
            .store
            .assignment(assignment_id)
            .await?
            .ok_or(CoreError::AssignmentNotFound(assignment_id))?;

        let submissions: Vec<_> = self
            .store
            .submissions_for_assignment(assignment_id)
            .await?
            .into_iter()
            .filter(|s| s.status >= SubmissionStatus::Submitted)
            .collect();
        if submissions.is_empty() {
            return Ok(None);
        }

        let scores: Vec<u32> = submissions.iter().map(|s| s.score()).collect();
        let count = scores.len();
        let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / count as f64;
        let max = scores.iter().copied().max().unwrap_or(0);
        let min = scores.iter().copied().min().unwrap_or(0);

        let student_scores = submissions
            .iter()
            .zip(&scores)
            .map(|(submission, &score)| StudentScore {
                student_id: submission.student_id,
                score,
            })
            .collect();

        let mut question_stats = Vec::with_capacity(assignment.questions.len());
        for question in &assignment.questions {
            let answers = self.store.answers_for_question(question.id).await?;
            question_stats.push(QuestionStats::compute(question, &answers));
        }

        Ok(Some(AssignmentMetrics {
            assignment_id,
            submission_count: count,
            mean_score: round2(mean),
            max_score: round2(f64::from(max)),
            min_score: round2(f64::from(min)),
            student_scores,
            question_stats,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Assignment, Evaluation, GradedBy, Submission};
    use crate::test_util::TestStore;
    use chrono::Utc;
    use serde_json::json;

    fn single_mcq_assignment(marks: u32) -> Assignment {
        Assignment::new("Arithmetic Quiz", "Maths", Uuid::new_v4(), marks).with_questions(vec![
            Question::multiple_choice("What is 2 + 2?", vec!["4".into(), "5".into()], "4", marks),
        ])
    }

    fn evaluated_submission(assignment: &Assignment, awarded: &[u32]) -> Submission {
        let answers: Vec<Answer> = assignment
            .questions
            .iter()
            .zip(awarded)
            .map(|(question, &marks_awarded)| Answer {
                id: Uuid::new_v4(),
                question_id: question.id,
                response: json!("whatever"),
                marks_awarded,
                feedback: String::new(),
            })
            .collect();
        let total: u32 = answers.iter().map(|a| a.marks_awarded).sum();
        Submission {
            id: Uuid::new_v4(),
            assignment_id: assignment.id,
            student_id: Uuid::new_v4(),
            status: SubmissionStatus::Evaluated,
            submitted_at: Utc::now(),
            answers,
            evaluation: Some(Evaluation {
                graded_by: GradedBy::Automatic,
                total_marks: total,
                overall_feedback: String::new(),
                evaluated_at: Utc::now(),
            }),
        }
    }

    #[tokio::test]
    async fn aggregate_reports_count_mean_and_extremes() {
        let assignment = single_mcq_assignment(20);
        let assignment_id = assignment.id;
        let store = Arc::new(TestStore::with_assignment(assignment.clone()));
        store.add_submission(evaluated_submission(&assignment, &[20]));
        store.add_submission(evaluated_submission(&assignment, &[10]));

        let metrics = MetricsAggregator::new(store)
            .aggregate(assignment_id)
            .await
            .unwrap()
            .expect("two submissions should yield metrics");

        assert_eq!(metrics.submission_count, 2);
        assert_eq!(metrics.mean_score, 15.0);
        assert_eq!(metrics.max_score, 20.0);
        assert_eq!(metrics.min_score, 10.0);
    }

    #[tokio::test]
    async fn aggregate_with_no_submissions_returns_none() {
        let assignment = single_mcq_assignment(20);
        let assignment_id = assignment.id;
        let store = Arc::new(TestStore::with_assignment(assignment));

        let metrics = MetricsAggregator::new(store)
            .aggregate(assignment_id)
            .await
            .unwrap();
        assert!(metrics.is_none());
    }

    #[tokio::test]
    async fn aggregate_excludes_drafts() {
        let assignment = single_mcq_assignment(20);
        let assignment_id = assignment.id;
        let store = Arc::new(TestStore::with_assignment(assignment.clone()));
        let mut draft = evaluated_submission(&assignment, &[20]);
        draft.status = SubmissionStatus::Draft;
        draft.evaluation = None;
        store.add_submission(draft);

        let metrics = MetricsAggregator::new(store)
            .aggregate(assignment_id)
            .await
            .unwrap();
        assert!(metrics.is_none(), "a lone draft must not produce metrics");
    }

    #[tokio::test]
    async fn aggregate_unknown_assignment_fails_not_found() {
        let store = Arc::new(TestStore::default());
        let missing = Uuid::new_v4();
        let result = MetricsAggregator::new(store).aggregate(missing).await;
        assert!(matches!(
            result,
            Err(CoreError::AssignmentNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn mean_is_rounded_to_two_decimals() {
        let assignment = single_mcq_assignment(20);
        let assignment_id = assignment.id;
        let store = Arc::new(TestStore::with_assignment(assignment.clone()));
        for awarded in [10, 10, 5] {
            store.add_submission(evaluated_submission(&assignment, &[awarded]));
        }

        let metrics = MetricsAggregator::new(store)
            .aggregate(assignment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metrics.mean_score, 8.33);
    }

    #[tokio::test]
    async fn question_stats_report_full_credit_rate_and_average() {
        let assignment = single_mcq_assignment(20);
        let assignment_id = assignment.id;
        let store = Arc::new(TestStore::with_assignment(assignment.clone()));
        store.add_submission(evaluated_submission(&assignment, &[20]));
        store.add_submission(evaluated_submission(&assignment, &[10]));

        let metrics = MetricsAggregator::new(store)
            .aggregate(assignment_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(metrics.question_stats.len(), 1);
        let stats = &metrics.question_stats[0];
        assert_eq!(stats.correct_rate, 0.5);
        assert_eq!(stats.average_marks, 15.0);
        assert_eq!(stats.kind, QuestionKind::MultipleChoice);
    }

    #[tokio::test]
    async fn unanswered_question_reports_zeros() {
        let mut assignment = single_mcq_assignment(20);
        assignment
            .questions
            .push(Question::free_text("Explain your reasoning at length.", 30));
        let assignment_id = assignment.id;
        let store = Arc::new(TestStore::with_assignment(assignment.clone()));
        // Submission answers only the first question.
        store.add_submission(evaluated_submission(&assignment, &[20]));

        let metrics = MetricsAggregator::new(store)
            .aggregate(assignment_id)
            .await
            .unwrap()
            .unwrap();

        let unanswered = &metrics.question_stats[1];
        assert_eq!(unanswered.correct_rate, 0.0);
        assert_eq!(unanswered.average_marks, 0.0);
    }

    #[test]
    fn excerpt_shortens_long_prompts() {
        let long = "x".repeat(80);
        let shortened = excerpt(&long);
        assert_eq!(shortened.len(), PROMPT_EXCERPT_LEN + 3);
        assert!(shortened.ends_with("..."));
        assert_eq!(excerpt("short prompt"), "short prompt");
    }
}
