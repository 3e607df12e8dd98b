//! Core data model types for gradeforge.
//!
//! These are the fundamental types the grading engine uses to represent
//! users, assignments, questions, submissions, and evaluation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of question kinds the grader understands.
///
/// Closed on purpose: an unrecognized kind string is rejected at the serde
/// boundary, so it can never reach grading at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    FreeText,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
            QuestionKind::FreeText => write!(f, "free-text"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "mcq" => Ok(QuestionKind::MultipleChoice),
            "free-text" | "descriptive" => Ok(QuestionKind::FreeText),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// The structured answer key stored on a question.
///
/// Kept as a one-field wrapper so the stored JSON shape is `{"answer": ...}`
/// and room remains for per-option keys later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    /// The correct answer, compared against responses after stringification.
    pub answer: Value,
}

/// A single gradable question within an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    pub id: Uuid,
    /// Question kind, which selects the grading strategy.
    pub kind: QuestionKind,
    /// Prompt text shown to the student.
    pub prompt: String,
    /// Answer options (multiple-choice only).
    #[serde(default)]
    pub options: Vec<String>,
    /// Structured answer key; typically absent for free-text questions.
    #[serde(default)]
    pub answer_key: Option<AnswerKey>,
    /// Maximum marks awardable for this question.
    pub marks: u32,
}

impl Question {
    /// Build a multiple-choice question with a correct answer.
    pub fn multiple_choice(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: impl Into<Value>,
        marks: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: QuestionKind::MultipleChoice,
            prompt: prompt.into(),
            options,
            answer_key: Some(AnswerKey {
                answer: correct.into(),
            }),
            marks,
        }
    }

    /// Build a free-text question (no answer key).
    pub fn free_text(prompt: impl Into<String>, marks: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: QuestionKind::FreeText,
            prompt: prompt.into(),
            options: Vec::new(),
            answer_key: None,
            marks,
        }
    }
}

/// A gradable unit of work with one or more questions.
///
/// `max_marks` is stored explicitly rather than derived from the question
/// list, matching how faculty declare assignment totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier for this assignment.
    pub id: Uuid,
    /// Assignment title.
    pub title: String,
    /// Subject the assignment belongs to.
    #[serde(default)]
    pub subject: String,
    /// Faculty member who owns this assignment.
    pub faculty_id: Uuid,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Declared maximum mark total.
    pub max_marks: u32,
    /// The assignment's questions, in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Assignment {
    pub fn new(
        title: impl Into<String>,
        subject: impl Into<String>,
        faculty_id: Uuid,
        max_marks: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            subject: subject.into(),
            faculty_id,
            due_date: None,
            max_marks,
            questions: Vec::new(),
        }
    }

    /// Attach questions, replacing any existing list.
    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions = questions;
        self
    }
}

/// Role of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

/// A platform user. The engine only consumes the display name and role;
/// everything else about identity lives outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Display name used in academic reports.
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// Lifecycle status of a submission.
///
/// Variant order matters: statuses are ordered so "submitted or later" is a
/// plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Evaluated,
}

/// Who produced an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradedBy {
    Automatic,
    Human,
}

/// One student's set of responses to an assignment.
///
/// A submission owns its answers and evaluation outright; dropping the
/// submission drops them with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier for this submission.
    pub id: Uuid,
    /// The assignment this submission answers.
    pub assignment_id: Uuid,
    /// The student who submitted.
    pub student_id: Uuid,
    /// Lifecycle status.
    pub status: SubmissionStatus,
    /// When the submission was received.
    pub submitted_at: DateTime<Utc>,
    /// Graded answers, in the assignment's question order.
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Submission-level evaluation, present once graded.
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
}

impl Submission {
    /// Total marks awarded across all answers.
    pub fn score(&self) -> u32 {
        self.answers.iter().map(|a| a.marks_awarded).sum()
    }
}

/// A graded response to a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Unique identifier for this answer.
    pub id: Uuid,
    /// The question answered.
    pub question_id: Uuid,
    /// Raw response payload: free text or the selected option(s).
    pub response: Value,
    /// Marks awarded, always within `0..=question.marks`.
    pub marks_awarded: u32,
    /// Per-answer feedback text.
    pub feedback: String,
}

/// Submission-level evaluation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Who graded the submission.
    pub graded_by: GradedBy,
    /// Total marks, equal to the sum of the submission's answer marks.
    pub total_marks: u32,
    /// Overall feedback for the whole submission.
    pub overall_feedback: String,
    /// When the evaluation was produced.
    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_kind_display_and_parse() {
        assert_eq!(QuestionKind::MultipleChoice.to_string(), "multiple-choice");
        assert_eq!(QuestionKind::FreeText.to_string(), "free-text");
        assert_eq!(
            "multiple-choice".parse::<QuestionKind>().unwrap(),
            QuestionKind::MultipleChoice
        );
        assert_eq!(
            "MCQ".parse::<QuestionKind>().unwrap(),
            QuestionKind::MultipleChoice
        );
        assert_eq!(
            "descriptive".parse::<QuestionKind>().unwrap(),
            QuestionKind::FreeText
        );
        assert!("essay".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn unknown_kind_is_rejected_at_deserialization() {
        let raw = r#"{"id":"00000000-0000-0000-0000-000000000001","kind":"true-false","prompt":"?","marks":5}"#;
        assert!(serde_json::from_str::<Question>(raw).is_err());
    }

    #[test]
    fn status_ordering_tracks_lifecycle() {
        assert!(SubmissionStatus::Draft < SubmissionStatus::Submitted);
        assert!(SubmissionStatus::Submitted < SubmissionStatus::Evaluated);
        assert!(SubmissionStatus::Submitted >= SubmissionStatus::Submitted);
    }

    #[test]
    fn question_serde_roundtrip() {
        let question = Question::multiple_choice(
            "What is 2 + 2?",
            vec!["3".into(), "4".into(), "5".into()],
            "4",
            20,
        );
        let json = serde_json::to_string(&question).unwrap();
        assert!(json.contains("\"multiple-choice\""));
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, QuestionKind::MultipleChoice);
        assert_eq!(back.answer_key.unwrap().answer, json!("4"));
        assert_eq!(back.marks, 20);
    }

    #[test]
    fn submission_score_sums_answer_marks() {
        let submission = Submission {
            id: Uuid::new_v4(),
            assignment_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            status: SubmissionStatus::Evaluated,
            submitted_at: Utc::now(),
            answers: vec![
                Answer {
                    id: Uuid::new_v4(),
                    question_id: Uuid::new_v4(),
                    response: json!("4"),
                    marks_awarded: 20,
                    feedback: "Correct".into(),
                },
                Answer {
                    id: Uuid::new_v4(),
                    question_id: Uuid::new_v4(),
                    response: json!("short answer"),
                    marks_awarded: 25,
                    feedback: "Partial credit".into(),
                },
            ],
            evaluation: None,
        };
        assert_eq!(submission.score(), 45);
    }
}
