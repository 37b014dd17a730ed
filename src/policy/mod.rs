//! Drafting policies — one per category, plus the registry that selects them.
//!
//! The category set is closed and small, so the registry holds one concrete
//! policy per category and hands out `&dyn DraftPolicy`. All policies share
//! the same hard-rule instruction block, prompt scaffolding, and structured
//! response format; they differ in their specialty instructions and in
//! whether they consume sanitized evidence.

mod business;
mod general;
mod information;
mod scheduling;

pub use business::BusinessPolicy;
pub use general::GeneralPolicy;
pub use information::InformationPolicy;
pub use scheduling::SchedulingPolicy;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::llm::structured::parse_structured;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::types::{Category, DraftResult, MeetingProposal, Message, SanitizedText};

/// Hard rules appended to every policy's system prompt.
///
/// These are the drafting-side half of the grounding guarantee: the
/// validator catches what slips through.
pub(crate) const HARD_RULES: &str = "\n\nHard rules (non-negotiable):\n\
     - NEVER state a specific address, phone number, or price unless it appears verbatim in the message or the provided evidence.\n\
     - Prefer asking a clarifying question over inventing a fact.\n\
     - Use hedged language (\"it appears\", \"as far as I can tell\") when uncertain.\n\
     - Respond with ONLY a JSON object:\n\
     {\"body\": \"...\", \"needs_meeting\": false, \"meeting\": null, \"cited_sources\": []}\n\
     - cited_sources lists the source ids of evidence entries you actually used.";

/// Everything a policy needs to produce one draft.
pub struct DraftContext<'a> {
    /// The inbound message being answered.
    pub message: &'a Message,
    /// Sanitized external evidence. Policies that don't do research ignore it.
    pub evidence: &'a [SanitizedText],
    /// Present on the orchestrator's single revision pass.
    pub revision: Option<&'a RevisionRequest>,
}

/// Instructions for the one-shot revision pass.
#[derive(Debug, Clone)]
pub struct RevisionRequest {
    /// The draft that failed grounding.
    pub previous_draft: String,
    /// The specific claims the validator could not support.
    pub unsupported_claims: Vec<String>,
}

/// A category-specific drafting strategy.
#[async_trait]
pub trait DraftPolicy: Send + Sync {
    /// The category this policy handles.
    fn category(&self) -> Category;

    /// Draft a response. Service failures surface as
    /// `PipelineError::Drafting`; the orchestrator converts those into the
    /// templated apology rather than propagating them outward.
    async fn draft(&self, ctx: &DraftContext<'_>) -> Result<DraftResult, PipelineError>;
}

/// Maps each category to its drafting policy.
pub struct PolicyRegistry {
    scheduling: SchedulingPolicy,
    business: BusinessPolicy,
    information: InformationPolicy,
    general: GeneralPolicy,
}

impl PolicyRegistry {
    /// Build the registry with one policy per category.
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self {
            scheduling: SchedulingPolicy::new(Arc::clone(&llm), config.clone()),
            business: BusinessPolicy::new(Arc::clone(&llm), config.clone()),
            information: InformationPolicy::new(Arc::clone(&llm), config.clone()),
            general: GeneralPolicy::new(llm, config),
        }
    }

    /// Select the policy for a category. `General` doubles as the fallback,
    /// so selection is total.
    pub fn select(&self, category: Category) -> &dyn DraftPolicy {
        match category {
            Category::Scheduling => &self.scheduling,
            Category::Business => &self.business,
            Category::Information => &self.information,
            Category::General => &self.general,
        }
    }
}

// ── Shared prompt scaffolding ───────────────────────────────────────

/// Build the user prompt for a draft call.
///
/// Evidence is included only when the policy consumes external research;
/// it has already been sanitized by the time it reaches here.
pub(crate) fn build_draft_prompt(ctx: &DraftContext<'_>, include_evidence: bool) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Draft a response to this message:\n\n");
    prompt.push_str(&format!("From: {}\n", ctx.message.sender));
    if let Some(ref subject) = ctx.message.subject {
        prompt.push_str(&format!("Subject: {subject}\n"));
    }
    prompt.push_str(&format!("\n{}\n", ctx.message.body));

    if include_evidence && !ctx.evidence.is_empty() {
        prompt.push_str("\nEvidence (sanitized, cite by source id):\n");
        for item in ctx.evidence {
            prompt.push_str(&format!("  [{}] {}\n", item.source_id, item.text));
        }
    }

    if let Some(revision) = ctx.revision {
        prompt.push_str("\nREVISION PASS: your previous draft contained claims that could not be verified against the message or evidence. Remove or hedge each of these claims — do not restate them as fact:\n");
        for claim in &revision.unsupported_claims {
            prompt.push_str(&format!("  - {claim}\n"));
        }
        prompt.push_str(&format!("\nPrevious draft:\n{}\n", revision.previous_draft));
    }

    prompt
}

/// Run a draft completion under the configured timeout.
///
/// Timeouts and provider failures both map to `PipelineError::Drafting`.
pub(crate) async fn complete_draft(
    llm: &Arc<dyn LlmProvider>,
    config: &PipelineConfig,
    system_prompt: String,
    user_prompt: String,
) -> Result<String, PipelineError> {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_prompt),
    ])
    .with_temperature(config.draft_temperature)
    .with_max_tokens(config.draft_max_tokens);

    match tokio::time::timeout(config.llm_timeout, llm.complete(request)).await {
        Ok(Ok(response)) => Ok(response.content),
        Ok(Err(e)) => Err(PipelineError::Drafting(format!("LLM call failed: {e}"))),
        Err(_) => Err(PipelineError::Drafting(format!(
            "LLM call timed out after {:?}",
            config.llm_timeout
        ))),
    }
}

// ── Shared response parsing ─────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct DraftResponse {
    #[serde(default)]
    body: String,
    #[serde(default)]
    needs_meeting: bool,
    #[serde(default)]
    meeting: Option<MeetingWire>,
    #[serde(default)]
    cited_sources: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct MeetingWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    duration_minutes: Option<u32>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

/// Parse a policy's structured draft response.
///
/// `allow_meeting` is true only for the scheduling policy — other policies
/// never emit a side-payload even if the model volunteers one.
pub(crate) fn parse_draft_response(
    raw: &str,
    allow_meeting: bool,
    config: &PipelineConfig,
    fallback_title: &str,
) -> Result<DraftResult, PipelineError> {
    let response: DraftResponse = parse_structured(raw)
        .map_err(|e| PipelineError::Drafting(format!("unparseable draft response: {e}")))?;

    if response.body.trim().is_empty() {
        return Err(PipelineError::Drafting("draft response had no body".into()));
    }

    let meeting = if allow_meeting && response.needs_meeting {
        response.meeting.and_then(|m| {
            let start = parse_meeting_start(&m.start_time)?;
            Some(MeetingProposal {
                title: if m.title.is_empty() {
                    fallback_title.to_string()
                } else {
                    m.title
                },
                start,
                duration_minutes: m
                    .duration_minutes
                    .unwrap_or(config.default_meeting_duration_minutes),
                timezone: m
                    .timezone
                    .unwrap_or_else(|| config.default_timezone.clone()),
                location: m.location,
            })
        })
    } else {
        None
    };

    if allow_meeting && response.needs_meeting && meeting.is_none() {
        warn!("Draft requested a meeting without an extractable start time, dropping side-payload");
    }

    Ok(DraftResult {
        body: response.body,
        meeting,
        cited_sources: response.cited_sources,
    })
}

/// Accepted start-time formats (models are inconsistent about the `T`).
const START_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_meeting_start(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    START_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_message() -> Message {
        Message {
            id: "m1".into(),
            sender: "alice@example.com".into(),
            recipients: vec!["me@example.com".into()],
            subject: Some("Catch up".into()),
            body: "Can we meet Tuesday at 3pm EST for 30 minutes?".into(),
            thread_ref: None,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_includes_message_fields() {
        let message = make_message();
        let ctx = DraftContext {
            message: &message,
            evidence: &[],
            revision: None,
        };
        let prompt = build_draft_prompt(&ctx, false);
        assert!(prompt.contains("alice@example.com"));
        assert!(prompt.contains("Catch up"));
        assert!(prompt.contains("Tuesday at 3pm"));
    }

    #[test]
    fn prompt_includes_evidence_when_enabled() {
        let message = make_message();
        let evidence = vec![SanitizedText {
            text: "The product launched last spring.".into(),
            source_id: "web-1".into(),
        }];
        let ctx = DraftContext {
            message: &message,
            evidence: &evidence,
            revision: None,
        };
        let with = build_draft_prompt(&ctx, true);
        assert!(with.contains("[web-1]"));
        assert!(with.contains("launched last spring"));

        let without = build_draft_prompt(&ctx, false);
        assert!(!without.contains("web-1"));
    }

    #[test]
    fn prompt_includes_revision_instructions() {
        let message = make_message();
        let revision = RevisionRequest {
            previous_draft: "Their revenue is $10M.".into(),
            unsupported_claims: vec!["revenue is $10M".into()],
        };
        let ctx = DraftContext {
            message: &message,
            evidence: &[],
            revision: Some(&revision),
        };
        let prompt = build_draft_prompt(&ctx, false);
        assert!(prompt.contains("REVISION PASS"));
        assert!(prompt.contains("revenue is $10M"));
        assert!(prompt.contains("Previous draft"));
    }

    #[test]
    fn parse_draft_basic() {
        let raw = r#"{"body": "Happy to help!", "needs_meeting": false, "meeting": null, "cited_sources": ["web-1"]}"#;
        let result =
            parse_draft_response(raw, false, &PipelineConfig::default(), "Meeting").unwrap();
        assert_eq!(result.body, "Happy to help!");
        assert!(result.meeting.is_none());
        assert_eq!(result.cited_sources, vec!["web-1".to_string()]);
    }

    #[test]
    fn parse_draft_with_meeting() {
        let raw = r#"{"body": "Tuesday works!", "needs_meeting": true, "meeting": {"title": "Sync", "start_time": "2026-09-01T15:00:00", "duration_minutes": 30, "timezone": "EST"}}"#;
        let result =
            parse_draft_response(raw, true, &PipelineConfig::default(), "Meeting").unwrap();
        let meeting = result.meeting.unwrap();
        assert_eq!(meeting.title, "Sync");
        assert_eq!(meeting.duration_minutes, 30);
        assert_eq!(meeting.timezone, "EST");
        assert_eq!(meeting.start.format("%H:%M").to_string(), "15:00");
    }

    #[test]
    fn parse_draft_meeting_suppressed_when_not_allowed() {
        let raw = r#"{"body": "Sure", "needs_meeting": true, "meeting": {"title": "Sync", "start_time": "2026-09-01T15:00:00"}}"#;
        let result =
            parse_draft_response(raw, false, &PipelineConfig::default(), "Meeting").unwrap();
        assert!(result.meeting.is_none());
    }

    #[test]
    fn parse_draft_meeting_defaults_applied() {
        let raw = r#"{"body": "Sure", "needs_meeting": true, "meeting": {"start_time": "2026-09-01 15:00"}}"#;
        let result =
            parse_draft_response(raw, true, &PipelineConfig::default(), "Catch up").unwrap();
        let meeting = result.meeting.unwrap();
        assert_eq!(meeting.title, "Catch up");
        assert_eq!(meeting.duration_minutes, 30);
        assert_eq!(meeting.timezone, "UTC");
    }

    #[test]
    fn parse_draft_unextractable_start_drops_meeting() {
        let raw = r#"{"body": "When are you free?", "needs_meeting": true, "meeting": {"title": "Sync", "start_time": "sometime next week"}}"#;
        let result =
            parse_draft_response(raw, true, &PipelineConfig::default(), "Meeting").unwrap();
        assert!(result.meeting.is_none());
    }

    #[test]
    fn parse_draft_empty_body_is_error() {
        let raw = r#"{"body": "", "needs_meeting": false}"#;
        let result = parse_draft_response(raw, false, &PipelineConfig::default(), "Meeting");
        assert!(result.is_err());
    }

    #[test]
    fn parse_draft_garbage_is_error() {
        let result = parse_draft_response(
            "I refuse to answer in JSON",
            false,
            &PipelineConfig::default(),
            "Meeting",
        );
        assert!(matches!(result, Err(PipelineError::Drafting(_))));
    }

    #[test]
    fn meeting_start_accepts_common_formats() {
        for raw in [
            "2026-09-01T15:00:00",
            "2026-09-01 15:00:00",
            "2026-09-01T15:00",
            "2026-09-01 15:00",
        ] {
            assert!(parse_meeting_start(raw).is_some(), "failed on {raw}");
        }
        assert!(parse_meeting_start("next Tuesday").is_none());
        assert!(parse_meeting_start("").is_none());
    }

    #[test]
    fn registry_selects_matching_policy() {
        let llm: Arc<dyn LlmProvider> = Arc::new(NoopLlm);
        let registry = PolicyRegistry::new(llm, PipelineConfig::default());
        assert_eq!(
            registry.select(Category::Scheduling).category(),
            Category::Scheduling
        );
        assert_eq!(
            registry.select(Category::Business).category(),
            Category::Business
        );
        assert_eq!(
            registry.select(Category::Information).category(),
            Category::Information
        );
        assert_eq!(
            registry.select(Category::General).category(),
            Category::General
        );
    }

    struct NoopLlm;

    #[async_trait]
    impl LlmProvider for NoopLlm {
        fn model_name(&self) -> &str {
            "noop"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<crate::llm::CompletionResponse, crate::error::LlmError> {
            unimplemented!("not called in registry tests")
        }
    }
}
