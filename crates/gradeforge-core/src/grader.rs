//! Per-answer grading.
//!
//! [`AnswerGrader`] scores one response against one question. Multiple-choice
//! grading is a pure, deterministic comparison; free-text grading delegates
//! to the configured [`AnswerEvaluator`] and degrades evaluator failures to
//! zero marks so a submission always finishes grading.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::model::{Question, QuestionKind};
use crate::traits::{AnswerEvaluator, EvaluateRequest};

/// Feedback attached when a free-text response is empty or absent.
pub const NO_ANSWER_FEEDBACK: &str = "No answer provided.";

/// The outcome of grading a single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    /// Marks awarded, within `0..=question.marks`.
    pub marks_awarded: u32,
    /// Feedback for the student.
    pub feedback: String,
}

/// Grades individual answers against their questions.
pub struct AnswerGrader {
    evaluator: Arc<dyn AnswerEvaluator>,
}

impl AnswerGrader {
    pub fn new(evaluator: Arc<dyn AnswerEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Score `response` against `question`.
    ///
    /// Total for every question kind: multiple-choice never fails, and a
    /// free-text evaluator failure degrades to zero marks with explanatory
    /// feedback instead of erroring. The answer record is never lost.
    pub async fn grade(&self, question: &Question, response: &Value) -> GradedAnswer {
        match question.kind {
            QuestionKind::MultipleChoice => grade_multiple_choice(question, response),
            QuestionKind::FreeText => self.grade_free_text(question, response).await,
        }
    }

    async fn grade_free_text(&self, question: &Question, response: &Value) -> GradedAnswer {
        let text = display_value(response);
        if text.trim().is_empty() {
            // Short-circuit: the evaluator is not consulted for empty answers.
            return GradedAnswer {
                marks_awarded: 0,
                feedback: NO_ANSWER_FEEDBACK.to_string(),
            };
        }

        let request = EvaluateRequest {
            question_text: question.prompt.clone(),
            response_text: text,
            max_marks: question.marks,
        };
        match self.evaluator.evaluate(&request).await {
            Ok(verdict) => GradedAnswer {
                marks_awarded: verdict.marks_awarded.min(question.marks),
                feedback: verdict.feedback,
            },
            Err(e) => {
                warn!(
                    evaluator = self.evaluator.name(),
                    question_id = %question.id,
                    error = %e,
                    "evaluator failed, awarding zero marks"
                );
                GradedAnswer {
                    marks_awarded: 0,
                    feedback: format!(
                        "Automatic evaluation was unavailable for this answer ({e}). \
                         Awarded 0 marks pending manual review."
                    ),
                }
            }
        }
    }
}

fn grade_multiple_choice(question: &Question, response: &Value) -> GradedAnswer {
    let key = question
        .answer_key
        .as_ref()
        .map(|k| display_value(&k.answer))
        .filter(|k| !k.is_empty());

    match key {
        Some(correct) if display_value(response) == correct => GradedAnswer {
            marks_awarded: question.marks,
            feedback: "Correct".to_string(),
        },
        Some(correct) => GradedAnswer {
            marks_awarded: 0,
            feedback: format!("Incorrect. Correct answer: {correct}"),
        },
        // An unkeyed multiple-choice question never grants credit.
        None => GradedAnswer {
            marks_awarded: 0,
            feedback: "Incorrect. Correct answer: None".to_string(),
        },
    }
}

/// Render a response payload the way it is compared and shown to students:
/// JSON strings without surrounding quotes, null as empty, anything else in
/// compact JSON form.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
