//! Message classifier — selects the response-drafting policy.
//!
//! Delegates to the text-generation service with a fixed instruction set
//! enumerating the four categories and requiring structured
//! `{category, confidence, rationale}` output.
//!
//! Failure policy: fail soft. Any service failure (rate limit, timeout,
//! malformed output, unknown label) folds into `Category::General` with
//! confidence 0.0 — the pipeline always keeps moving. Retries, if any, are
//! the caller's concern, not this component's.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::llm::structured::parse_structured;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{Category, Classification, Message};

/// Body preview length for the classification prompt (token economy —
/// this call runs on every message).
const BODY_PREVIEW_CHARS: usize = 1000;

/// Classifier that assigns one category and a confidence to each message.
pub struct Classifier {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl Classifier {
    /// Create a new classifier.
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    /// Classify a message. Infallible — failures fold into the GENERAL
    /// fallback so routing can always proceed.
    pub async fn classify(&self, message: &Message) -> Classification {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(message)),
        ])
        .with_temperature(self.config.analysis_temperature)
        .with_max_tokens(self.config.classify_max_tokens);

        let raw = match tokio::time::timeout(self.config.llm_timeout, self.llm.complete(request))
            .await
        {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                warn!(id = %message.id, error = %e, "Classification call failed, falling back to general");
                return fallback(format!("service failure: {e}"));
            }
            Err(_) => {
                warn!(
                    id = %message.id,
                    timeout = ?self.config.llm_timeout,
                    "Classification call timed out, falling back to general"
                );
                return fallback("service timeout".to_string());
            }
        };

        let classification = match parse_response(&raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(id = %message.id, raw_response = %raw, error = %e, "Unparseable classification, falling back to general");
                return fallback(format!("unparseable output: {e}"));
            }
        };

        // Thresholding is advisory only — the service's top choice stands.
        if classification.confidence < self.config.confidence_floor {
            warn!(
                id = %message.id,
                category = classification.category.label(),
                confidence = classification.confidence,
                floor = self.config.confidence_floor,
                "Classification confidence below floor (routing anyway)"
            );
        } else {
            debug!(
                id = %message.id,
                category = classification.category.label(),
                confidence = classification.confidence,
                "Message classified"
            );
        }

        classification
    }
}

/// GENERAL fallback used for every classification failure.
fn fallback(reason: String) -> Classification {
    Classification {
        category: Category::General,
        confidence: 0.0,
        rationale: format!("classifier fallback: {reason}"),
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    "You are a message classifier for an automated response assistant. \
     Assign each incoming message to exactly one category:\n\n\
     - \"scheduling\": meeting requests, calendar coordination, availability queries\n\
     - \"business\": sales inquiries, customer support, negotiations, partnerships\n\
     - \"information\": factual questions needing research-backed answers\n\
     - \"general\": everything else (casual conversation, thanks, misc)\n\n\
     Respond with ONLY a JSON object:\n\
     {\"category\": \"scheduling|business|information|general\", \"confidence\": 0.0, \"rationale\": \"...\"}\n\n\
     Rules:\n\
     - confidence is a float between 0.0 and 1.0\n\
     - rationale is 1-2 sentences\n\
     - pick the single best category even when uncertain"
        .to_string()
}

fn build_user_prompt(message: &Message) -> String {
    let mut prompt = String::with_capacity(512);

    prompt.push_str(&format!("From: {}\n", message.sender));
    if let Some(ref subject) = message.subject {
        prompt.push_str(&format!("Subject: {subject}\n"));
    }

    let preview: String = message.body.chars().take(BODY_PREVIEW_CHARS).collect();
    prompt.push_str(&format!("\nMessage:\n{preview}"));

    prompt
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct ClassifyResponse {
    category: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    rationale: String,
}

fn parse_response(raw: &str) -> Result<Classification, String> {
    let response: ClassifyResponse = parse_structured(raw)?;

    let category = Category::parse(&response.category)
        .ok_or_else(|| format!("unknown category label: '{}'", response.category))?;

    Ok(Classification {
        category,
        confidence: response.confidence.clamp(0.0, 1.0),
        rationale: response.rationale,
    })
}
