//! Business policy — professional correspondence drafts, evidence-aware.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::llm::LlmProvider;
use crate::pipeline::types::{Category, DraftResult};
use crate::policy::{
    DraftContext, DraftPolicy, HARD_RULES, build_draft_prompt, complete_draft,
    parse_draft_response,
};

/// Drafts responses to sales inquiries, support requests, and partnership
/// conversations. Consumes sanitized evidence when research was supplied.
pub struct BusinessPolicy {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl BusinessPolicy {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a business correspondence assistant drafting professional replies.\n\n\
             Your specialties:\n\
             - sales inquiries and proposals\n\
             - customer support and issue resolution\n\
             - negotiations and partnership opportunities\n\n\
             Style: professional yet personable, solution-oriented, concise, \
             with clear next steps.{rules}",
            rules = HARD_RULES,
        )
    }
}

#[async_trait]
impl DraftPolicy for BusinessPolicy {
    fn category(&self) -> Category {
        Category::Business
    }

    async fn draft(&self, ctx: &DraftContext<'_>) -> Result<DraftResult, PipelineError> {
        let user_prompt = build_draft_prompt(ctx, true);
        let raw = complete_draft(&self.llm, &self.config, self.system_prompt(), user_prompt).await?;
        // Business drafts never schedule directly — that's the scheduling
        // policy's job after a follow-up classification.
        parse_draft_response(&raw, false, &self.config, "Meeting")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use std::sync::Mutex;

    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason};
    use crate::pipeline::types::{Message, SanitizedText};

    /// Mock that records the prompts it receives.
    struct RecordingLlm {
        response: String,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            Ok(CompletionResponse {
                content: self.response.clone(),
                input_tokens: 100,
                output_tokens: 80,
                finish_reason: FinishReason::Stop,
                response_id: None,
            })
        }
    }

    fn make_message() -> Message {
        Message {
            id: "m1".into(),
            sender: "buyer@corp.example".into(),
            recipients: vec!["me@example.com".into()],
            subject: Some("Pricing question".into()),
            body: "What would licensing look like for a 50-seat team?".into(),
            thread_ref: None,
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn includes_sanitized_evidence_in_prompt() {
        let llm = Arc::new(RecordingLlm {
            response: r#"{"body": "Happy to walk you through licensing.", "cited_sources": ["web-1"]}"#.into(),
            requests: Mutex::new(Vec::new()),
        });
        let policy = BusinessPolicy::new(Arc::clone(&llm) as Arc<dyn LlmProvider>, PipelineConfig::default());

        let message = make_message();
        let evidence = vec![SanitizedText {
            text: "Team licenses are priced at [redacted] per seat.".into(),
            source_id: "web-1".into(),
        }];
        let ctx = DraftContext {
            message: &message,
            evidence: &evidence,
            revision: None,
        };
        let result = policy.draft(&ctx).await.unwrap();
        assert_eq!(result.cited_sources, vec!["web-1".to_string()]);

        let requests = llm.requests.lock().unwrap();
        let user_prompt = &requests[0].messages[1].content;
        assert!(user_prompt.contains("[web-1]"));
        assert!(user_prompt.contains("[redacted] per seat"));
    }

    #[tokio::test]
    async fn never_emits_meeting_side_payload() {
        let llm = Arc::new(RecordingLlm {
            response: r#"{"body": "Let's discuss.", "needs_meeting": true,
                "meeting": {"title": "Call", "start_time": "2026-09-01T10:00:00"}}"#
                .into(),
            requests: Mutex::new(Vec::new()),
        });
        let policy = BusinessPolicy::new(llm as Arc<dyn LlmProvider>, PipelineConfig::default());

        let message = make_message();
        let ctx = DraftContext {
            message: &message,
            evidence: &[],
            revision: None,
        };
        let result = policy.draft(&ctx).await.unwrap();
        assert!(result.meeting.is_none());
    }
}
