//! Scheduling policy — calendar coordination drafts with an optional
//! meeting side-payload.

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

/// Drafts scheduling responses. When the message carries an extractable time
/// preference the draft includes a `MeetingProposal`; otherwise it asks for
/// availability instead of guessing a time.
pub struct SchedulingPolicy {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl SchedulingPolicy {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a scheduling assistant drafting replies about meetings and calendar coordination.\n\n\
             Your specialties:\n\
             - proposing concrete meeting times from preferences stated in the message\n\
             - coordinating across time zones\n\
             - confirming duration and format\n\n\
             Defaults when the message doesn't specify: timezone {tz}, duration {dur} minutes.\n\n\
             Meeting extraction:\n\
             - If the message states a concrete time preference, set needs_meeting true and fill \
               meeting with title, start_time (ISO 8601 local time, e.g. \"2026-09-01T15:00:00\"), \
               duration_minutes, and timezone.\n\
             - If no concrete time can be extracted, set needs_meeting false and ask for the \
               sender's availability instead of guessing.{rules}",
            tz = self.config.default_timezone,
            dur = self.config.default_meeting_duration_minutes,
            rules = HARD_RULES,
        )
    }
}

#[async_trait]
impl DraftPolicy for SchedulingPolicy {
    fn category(&self) -> Category {
        Category::Scheduling
    }

    async fn draft(&self, ctx: &DraftContext<'_>) -> Result<DraftResult, PipelineError> {
        // Scheduling never consumes external evidence — times come from the
        // message itself.
        let user_prompt = build_draft_prompt(ctx, false);
        let raw = complete_draft(&self.llm, &self.config, self.system_prompt(), user_prompt).await?;

        let fallback_title = ctx
            .message
            .subject
            .as_deref()
            .unwrap_or("Meeting");
        parse_draft_response(&raw, true, &self.config, fallback_title)
    }
}
