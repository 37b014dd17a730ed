//! General policy — polite default drafts, also the fallback for failed
//! classification.

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

/// Drafts a polite, context-appropriate reply for anything the specialized
/// policies don't cover.
pub struct GeneralPolicy {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl GeneralPolicy {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a correspondence assistant drafting polite, professional replies. \
             Keep the tone friendly and appropriate for the context, and keep it brief.{rules}",
            rules = HARD_RULES,
        )
    }
}

#[async_trait]
impl DraftPolicy for GeneralPolicy {
    fn category(&self) -> Category {
        Category::General
    }

    async fn draft(&self, ctx: &DraftContext<'_>) -> Result<DraftResult, PipelineError> {
        let user_prompt = build_draft_prompt(ctx, false);
        let raw = complete_draft(&self.llm, &self.config, self.system_prompt(), user_prompt).await?;
        parse_draft_response(&raw, false, &self.config, "Meeting")
    }
}
