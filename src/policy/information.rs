//! Information policy — research-backed answers drafted from sanitized
//! evidence.

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

/// Drafts answers to factual questions. The only material it may draw
/// specifics from is the message itself and the sanitized evidence; when the
/// evidence doesn't cover the question it says so rather than filling gaps.
pub struct InformationPolicy {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl InformationPolicy {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a research assistant drafting informative replies to factual questions.\n\n\
             Your specialties:\n\
             - answering factual questions from the supplied evidence\n\
             - clearly structured, well-attributed explanations\n\n\
             Every concrete fact in your reply must come from the message or the supplied \
             evidence entries; cite the evidence entries you use by source id. If the evidence \
             does not answer the question, say what is missing and ask for it — do not fill \
             the gap from memory.{rules}",
            rules = HARD_RULES,
        )
    }
}

#[async_trait]
impl DraftPolicy for InformationPolicy {
    fn category(&self) -> Category {
        Category::Information
    }

    async fn draft(&self, ctx: &DraftContext<'_>) -> Result<DraftResult, PipelineError> {
        let user_prompt = build_draft_prompt(ctx, true);
        let raw = complete_draft(&self.llm, &self.config, self.system_prompt(), user_prompt).await?;
        parse_draft_response(&raw, false, &self.config, "Meeting")
    }
}
