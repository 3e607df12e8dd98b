//! Offline heuristic evaluator.
//!
//! Scores free-text answers by length bands. No network, deterministic,
//! and the fallback when no API-backed evaluator is configured.

use async_trait::async_trait;

use gradeforge_core::error::EvaluatorError;
use gradeforge_core::traits::{AnswerEvaluator, EvaluateRequest, EvaluatorVerdict};

/// Length-band scorer for free-text answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEvaluator;

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnswerEvaluator for HeuristicEvaluator {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn evaluate(
        &self,
        request: &EvaluateRequest,
    ) -> Result<EvaluatorVerdict, EvaluatorError> {
        let response = request.response_text.trim();
        let max = request.max_marks;
        let words = response.split_whitespace().count();

        let (marks, feedback, confidence) = if response.is_empty() {
            (0, "No answer provided.", 1.0)
        } else if words < 5 {
            (
                if max > 2 { 1 } else { 0 },
                "Answer is too brief to be informative.",
                0.8,
            )
        } else if words < 20 {
            (
                max / 2,
                "Good start, but needs more depth and specific examples.",
                0.8,
            )
        } else {
            (
                (f64::from(max) * 0.85) as u32,
                "Comprehensive answer covering key aspects of the topic. Well structured.",
                0.8,
            )
        };

        Ok(EvaluatorVerdict {
            marks_awarded: marks.min(max),
            feedback: feedback.to_string(),
            confidence,
        })
    }
}
