//! Grounding validator — checks a draft against its trusted sources.
//!
//! Trusted sources are the original message body plus every sanitized
//! evidence entry. The validator asks the LLM to enumerate each concrete
//! factual claim in the draft and partition the claims into
//! validated / unsupported / missing.
//!
//! Failure policy: fail closed. If the structured response can't be obtained
//! or parsed, the verdict is "not grounded" with confidence 0.0 — never the
//! optimistic default. This component classifies the draft; it never
//! mutates it.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::llm::structured::parse_structured;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{GroundingResult, SanitizedText};

/// Validator comparing drafts against trusted source material.
pub struct GroundingValidator {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl GroundingValidator {
    /// Create a new validator.
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    /// Validate a draft against the message body and sanitized evidence.
    ///
    /// Infallible: every failure path returns the fail-closed default.
    pub async fn validate(
        &self,
        draft: &str,
        message_body: &str,
        evidence: &[SanitizedText],
    ) -> GroundingResult {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(draft, message_body, evidence)),
        ])
        .with_temperature(self.config.analysis_temperature)
        .with_max_tokens(self.config.draft_max_tokens);

        let raw = match tokio::time::timeout(self.config.llm_timeout, self.llm.complete(request))
            .await
        {
            Ok(Ok(response)) => response.content,
            Ok(Err(e)) => {
                warn!(error = %e, "Validation call failed, failing closed");
                return GroundingResult::fail_closed();
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.llm_timeout,
                    "Validation call timed out, failing closed"
                );
                return GroundingResult::fail_closed();
            }
        };

        match parse_response(&raw) {
            Ok(result) => {
                debug!(
                    is_grounded = result.is_grounded,
                    confidence = result.confidence,
                    unsupported = result.unsupported_claims.len(),
                    missing = result.missing_facts.len(),
                    "Draft validated"
                );
                result
            }
            Err(e) => {
                warn!(raw_response = %raw, error = %e, "Unparseable validation response, failing closed");
                GroundingResult::fail_closed()
            }
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    "You are a fact-checking engine. Compare a draft reply against its trusted sources.\n\n\
     Steps:\n\
     1. List every concrete factual claim in the draft (names, numbers, dates, \
        addresses, prices, events). Greetings, hedges, and questions are not claims.\n\
     2. For each claim, decide whether the trusted sources support it, verbatim or by \
        close paraphrase.\n\
     3. Partition the claims and respond with ONLY a JSON object:\n\
     {\"is_grounded\": true, \"confidence\": 0.0, \"validated_facts\": [], \
      \"unsupported_claims\": [], \"missing_facts\": []}\n\n\
     Rules:\n\
     - is_grounded is true only when unsupported_claims is empty\n\
     - missing_facts lists information the reply needs but the sources don't contain\n\
     - confidence is a float between 0.0 and 1.0\n\
     - when in doubt about a claim, call it unsupported"
        .to_string()
}

fn build_user_prompt(draft: &str, message_body: &str, evidence: &[SanitizedText]) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Trusted sources:\n\n--- Original message ---\n");
    prompt.push_str(message_body);
    prompt.push('\n');

    for item in evidence {
        prompt.push_str(&format!("\n--- Evidence [{}] ---\n{}\n", item.source_id, item.text));
    }

    prompt.push_str("\n--- Draft to check ---\n");
    prompt.push_str(draft);

    prompt
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct ValidationResponse {
    is_grounded: bool,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    validated_facts: BTreeSet<String>,
    #[serde(default)]
    unsupported_claims: BTreeSet<String>,
    #[serde(default)]
    missing_facts: BTreeSet<String>,
}

fn parse_response(raw: &str) -> Result<GroundingResult, String> {
    let response: ValidationResponse = parse_structured(raw)?;

    // A verdict that claims grounding while listing unsupported claims is
    // internally inconsistent — resolve it conservatively.
    let is_grounded = response.is_grounded && response.unsupported_claims.is_empty();

    Ok(GroundingResult {
        is_grounded,
        confidence: response.confidence.clamp(0.0, 1.0),
        validated_facts: response.validated_facts,
        unsupported_claims: response.unsupported_claims,
        missing_facts: response.missing_facts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, FinishReason};

    struct FixedLlm {
        result: std::result::Result<String, ()>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, LlmError> {
            match &self.result {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    input_tokens: 200,
                    output_tokens: 100,
                    finish_reason: FinishReason::Stop,
                    response_id: None,
                }),
                Err(()) => Err(LlmError::RateLimited {
                    provider: "fixed".into(),
                    retry_after: None,
                }),
            }
        }
    }

    fn validator_with(result: std::result::Result<String, ()>) -> GroundingValidator {
        GroundingValidator::new(Arc::new(FixedLlm { result }), PipelineConfig::default())
    }

    #[tokio::test]
    async fn grounded_verdict_parses() {
        let validator = validator_with(Ok(r#"{
            "is_grounded": true, "confidence": 0.95,
            "validated_facts": ["meeting is Tuesday"],
            "unsupported_claims": [], "missing_facts": []
        }"#
        .into()));

        let result = validator
            .validate("Tuesday works for me!", "Can we meet Tuesday?", &[])
            .await;
        assert!(result.is_grounded);
        assert!((result.confidence - 0.95).abs() < 0.01);
        assert!(result.validated_facts.contains("meeting is Tuesday"));
    }

    #[tokio::test]
    async fn unsupported_claims_parse() {
        let validator = validator_with(Ok(r#"{
            "is_grounded": false, "confidence": 0.8,
            "validated_facts": [],
            "unsupported_claims": ["revenue is $50M"],
            "missing_facts": ["competitor revenue figure"]
        }"#
        .into()));

        let result = validator
            .validate("Their revenue is $50M.", "What's their revenue?", &[])
            .await;
        assert!(!result.is_grounded);
        assert!(result.unsupported_claims.contains("revenue is $50M"));
        assert!(result.missing_facts.contains("competitor revenue figure"));
    }

    #[tokio::test]
    async fn unparseable_response_fails_closed() {
        let validator = validator_with(Ok("Looks good to me!".into()));
        let result = validator.validate("draft", "message", &[]).await;
        assert!(!result.is_grounded);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn service_failure_fails_closed() {
        let validator = validator_with(Err(()));
        let result = validator.validate("draft", "message", &[]).await;
        assert!(!result.is_grounded);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn inconsistent_verdict_resolved_conservatively() {
        // Model says grounded but also lists unsupported claims.
        let validator = validator_with(Ok(r#"{
            "is_grounded": true, "confidence": 0.7,
            "validated_facts": [],
            "unsupported_claims": ["made-up detail"],
            "missing_facts": []
        }"#
        .into()));
        let result = validator.validate("draft", "message", &[]).await;
        assert!(!result.is_grounded);
    }

    #[tokio::test]
    async fn confidence_clamped() {
        let validator = validator_with(Ok(
            r#"{"is_grounded": true, "confidence": 3.0, "unsupported_claims": []}"#.into(),
        ));
        let result = validator.validate("draft", "message", &[]).await;
        assert!((result.confidence - 1.0).abs() < 0.01);
    }

    #[test]
    fn user_prompt_concatenates_all_sources() {
        let evidence = vec![
            SanitizedText {
                text: "Launched in spring.".into(),
                source_id: "web-1".into(),
            },
            SanitizedText {
                text: "Headquartered at [redacted].".into(),
                source_id: "web-2".into(),
            },
        ];
        let prompt = build_user_prompt("The launch was in spring.", "When did it launch?", &evidence);
        assert!(prompt.contains("Original message"));
        assert!(prompt.contains("When did it launch?"));
        assert!(prompt.contains("Evidence [web-1]"));
        assert!(prompt.contains("Evidence [web-2]"));
        assert!(prompt.contains("Draft to check"));
    }
}
