//! OpenAI-backed answer evaluator.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use gradeforge_core::error::EvaluatorError;
use gradeforge_core::traits::{AnswerEvaluator, EvaluateRequest, EvaluatorVerdict};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default model for grading calls.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const GRADING_PROMPT: &str = "You are an exacting but fair teaching assistant grading one answer. Respond ONLY with a JSON object of the form {\"marks\": <integer>, \"feedback\": \"<one or two sentences for the student>\", \"confidence\": <number between 0 and 1>}. Marks must not exceed the stated maximum. Do not include explanations outside the JSON object.";

/// OpenAI-compatible chat-completions evaluator.
pub struct OpenAiEvaluator {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiEvaluator {
    pub fn new(api_key: &str, model: Option<String>, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct RawVerdict {
    marks: u32,
    feedback: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Extract the first JSON object from a reply that may wrap it in markdown
/// fences or surrounding prose.
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end >= start).then(|| &content[start..=end])
}

#[async_trait]
impl AnswerEvaluator for OpenAiEvaluator {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model, max_marks = request.max_marks))]
    async fn evaluate(
        &self,
        request: &EvaluateRequest,
    ) -> Result<EvaluatorVerdict, EvaluatorError> {
        let start = Instant::now();

        let user_prompt = format!(
            "Question: {}\n\nMaximum marks: {}\n\nStudent answer: {}",
            request.question_text, request.max_marks, request.response_text
        );

        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: 300,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: GRADING_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvaluatorError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    EvaluatorError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(EvaluatorError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::ApiError {
                status,
                message: body,
            });
        }

        let api_response: ChatResponse = response.json().await.map_err(|e| {
            EvaluatorError::MalformedVerdict(format!("failed to parse response: {e}"))
        })?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();
        let verdict_json = extract_json(content).ok_or_else(|| {
            EvaluatorError::MalformedVerdict(format!("no JSON object in reply: {content}"))
        })?;
        let raw: RawVerdict = serde_json::from_str(verdict_json)
            .map_err(|e| EvaluatorError::MalformedVerdict(format!("{e}: {verdict_json}")))?;

        tracing::debug!(
            marks = raw.marks,
            latency_ms = start.elapsed().as_millis() as u64,
            "verdict received"
        );

        Ok(EvaluatorVerdict {
            marks_awarded: raw.marks.min(request.max_marks),
            feedback: raw.feedback,
            confidence: raw.confidence.clamp(0.0, 1.0),
        })
    }
}
