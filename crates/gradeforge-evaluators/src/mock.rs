//! Mock evaluator for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use gradeforge_core::error::EvaluatorError;
use gradeforge_core::traits::{AnswerEvaluator, EvaluateRequest, EvaluatorVerdict};

/// A mock evaluator for exercising the grading pipeline without API calls.
///
/// Awards configurable marks based on response content matching, or plays
/// back a scripted queue of per-call outcomes, failures included.
pub struct MockEvaluator {
    /// Map of response substring → marks to award.
    responses: HashMap<String, u32>,
    /// Marks awarded when no substring matches.
    default_marks: u32,
    /// Scripted outcomes consumed one per call, ahead of substring matching.
    script: Mutex<VecDeque<Result<u32, EvaluatorError>>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<EvaluateRequest>>,
}

impl MockEvaluator {
    /// Create a mock with the given response-substring → marks mappings.
    pub fn new(responses: HashMap<String, u32>) -> Self {
        Self {
            responses,
            default_marks: 0,
            script: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always awards the same marks.
    pub fn with_fixed_marks(marks: u32) -> Self {
        Self {
            responses: HashMap::new(),
            default_marks: marks,
            script: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that plays back `outcomes` in order, one per call.
    ///
    /// An `Err` outcome is returned to the caller as-is, so evaluator
    /// failure handling can be driven from tests. Calls after the queue is
    /// exhausted award zero marks.
    pub fn with_script(outcomes: Vec<Result<u32, EvaluatorError>>) -> Self {
        Self {
            responses: HashMap::new(),
            default_marks: 0,
            script: Mutex::new(outcomes.into()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of calls made to this evaluator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this evaluator.
    pub fn last_request(&self) -> Option<EvaluateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerEvaluator for MockEvaluator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn evaluate(
        &self,
        request: &EvaluateRequest,
    ) -> Result<EvaluatorVerdict, EvaluatorError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let scripted = self.script.lock().unwrap().pop_front();
        let marks = match scripted {
            Some(outcome) => outcome?,
            // Find a matching award based on response content
            None => self
                .responses
                .iter()
                .find(|(key, _)| request.response_text.contains(key.as_str()))
                .map(|(_, marks)| *marks)
                .unwrap_or(self.default_marks),
        };

        Ok(EvaluatorVerdict {
            marks_awarded: marks.min(request.max_marks),
            feedback: "Scored by mock evaluator.".to_string(),
            confidence: 1.0,
        })
    }
}
