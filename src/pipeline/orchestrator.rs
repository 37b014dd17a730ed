//! Response orchestrator — drives a message through classify, draft,
//! validate, and the single revision cycle, and always produces a sendable
//! `FinalResponse`.
//!
//! State machine per message:
//!
//! ```text
//! Classifying -> Drafting -> Validating -> Approved
//!                    |            |
//!                    |            +-> Revising -> Validating -> RevisedApproved
//!                    |            |                    |
//!                    |            +-> Rejected <-------+
//!                    +-> Rejected (drafting failed)
//! ```
//!
//! `process` is infallible: drafting failures become a templated apology,
//! grounding failures become a disclaimer wrap or a clarifying question.
//! Nothing escalates to a human and nothing returns an error to the
//! transport layer.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::llm::LlmProvider;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::types::{
    AuditTrail, Category, Classification, DraftResult, EvidenceItem, FinalResponse,
    GroundingResult, MeetingProposal, Message, ResponseOutcome, SanitizedText,
};
use crate::pipeline::validator::GroundingValidator;
use crate::policy::{DraftContext, PolicyRegistry, RevisionRequest};
use crate::safety::EvidenceSanitizer;

/// Disclaimer prefixed to a best-effort draft that never passed grounding.
const DISCLAIMER: &str =
    "Note: some details in this reply could not be independently verified, \
     so please treat them as tentative.\n\n";

/// Body substituted when drafting fails outright.
const APOLOGY: &str =
    "Thank you for your message. I wasn't able to put together a proper reply \
     just now, but I'll follow up with you shortly.";

/// Coordinates the full pipeline for one message at a time.
///
/// Holds no per-message state, so a single instance serves concurrent
/// `process` calls without interference.
pub struct ResponseOrchestrator {
    classifier: Classifier,
    registry: PolicyRegistry,
    validator: GroundingValidator,
    sanitizer: EvidenceSanitizer,
}

impl ResponseOrchestrator {
    /// Build the orchestrator and its components around one shared provider.
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&llm), config.clone()),
            registry: PolicyRegistry::new(Arc::clone(&llm), config.clone()),
            validator: GroundingValidator::new(llm, config),
            sanitizer: EvidenceSanitizer::new(),
        }
    }

    /// Process one message end to end. Always returns a sendable response.
    #[instrument(skip_all, fields(message_id = %message.id))]
    pub async fn process(&self, message: &Message, evidence: Vec<EvidenceItem>) -> FinalResponse {
        let run_id = Uuid::new_v4();

        // Sanitize before anything downstream can observe the raw evidence.
        let evidence = self.sanitizer.clean_evidence(evidence);

        let classification = self.classifier.classify(message).await;
        info!(
            run_id = %run_id,
            category = classification.category.label(),
            confidence = classification.confidence,
            "Message classified"
        );

        let ctx = DraftContext {
            message,
            evidence: &evidence,
            revision: None,
        };
        let draft = match self.registry.select(classification.category).draft(&ctx).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Drafting failed, substituting apology");
                return finish(
                    run_id,
                    classification,
                    ResponseOutcome::Unprocessable,
                    APOLOGY.to_string(),
                    None,
                    None,
                    None,
                );
            }
        };

        let first_pass = self
            .validator
            .validate(&draft.body, &message.body, &evidence)
            .await;

        if first_pass.is_grounded {
            return finish(
                run_id,
                classification,
                ResponseOutcome::Approved,
                draft.body,
                draft.meeting,
                Some(first_pass),
                None,
            );
        }

        // One revision pass, and only when the validator named the claims to
        // fix. A fail-closed verdict carries nothing actionable to revise
        // against, so it goes straight to the fallback.
        let revision = if first_pass.unsupported_claims.is_empty() {
            None
        } else {
            self.revise(message, &evidence, classification.category, &draft, &first_pass, run_id)
                .await
        };

        // Fall back with the latest draft: the hedged revision when one was
        // produced, the original otherwise. The rejected first draft is
        // never re-sent once a revision exists.
        let (fallback_body, second_pass) = match revision {
            Some((revised, verdict)) if verdict.is_grounded => {
                return finish(
                    run_id,
                    classification,
                    ResponseOutcome::RevisedApproved,
                    revised.body,
                    revised.meeting,
                    Some(first_pass),
                    Some(verdict),
                );
            }
            Some((revised, verdict)) => (revised.body, Some(verdict)),
            None => (draft.body, None),
        };

        // Ask for the missing information when the validator identified any;
        // otherwise send the fallback draft under a disclaimer. Side-payloads
        // never ship with unapproved bodies.
        let last_verdict = second_pass.as_ref().unwrap_or(&first_pass);
        let (outcome, body) = if last_verdict.missing_facts.is_empty() {
            (
                ResponseOutcome::Disclaimed,
                format!("{DISCLAIMER}{fallback_body}"),
            )
        } else {
            (
                ResponseOutcome::ClarificationRequested,
                build_clarifying_question(last_verdict),
            )
        };

        finish(
            run_id,
            classification,
            outcome,
            body,
            None,
            Some(first_pass),
            second_pass,
        )
    }

    /// Run the single revision cycle under the same policy as the first
    /// draft: redraft with the unsupported claims called out, then
    /// re-validate. A drafting failure on this pass is not retried.
    async fn revise(
        &self,
        message: &Message,
        evidence: &[SanitizedText],
        category: Category,
        draft: &DraftResult,
        first_pass: &GroundingResult,
        run_id: Uuid,
    ) -> Option<(DraftResult, GroundingResult)> {
        let revision = RevisionRequest {
            previous_draft: draft.body.clone(),
            unsupported_claims: first_pass.unsupported_claims.iter().cloned().collect(),
        };
        let ctx = DraftContext {
            message,
            evidence,
            revision: Some(&revision),
        };

        info!(
            run_id = %run_id,
            unsupported = first_pass.unsupported_claims.len(),
            "Draft failed grounding, running revision pass"
        );

        let revised = match self.registry.select(category).draft(&ctx).await {
            Ok(revised) => revised,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Revision draft failed");
                return None;
            }
        };

        let second_pass = self
            .validator
            .validate(&revised.body, &message.body, evidence)
            .await;
        Some((revised, second_pass))
    }
}

fn finish(
    run_id: Uuid,
    classification: Classification,
    outcome: ResponseOutcome,
    body: String,
    meeting: Option<MeetingProposal>,
    first_pass: Option<GroundingResult>,
    second_pass: Option<GroundingResult>,
) -> FinalResponse {
    info!(run_id = %run_id, outcome = outcome.label(), "Pipeline run finished");
    FinalResponse {
        body,
        meeting,
        outcome,
        audit: AuditTrail {
            run_id,
            classification,
            first_pass,
            second_pass,
        },
    }
}

/// Build the clarifying-question body from the validator's missing facts.
fn build_clarifying_question(verdict: &GroundingResult) -> String {
    let mut body = String::from(
        "Thanks for reaching out. Before I can give you a reliable answer, \
         could you help me with the following?\n",
    );
    for fact in &verdict.missing_facts {
        body.push_str(&format!("  - {fact}\n"));
    }
    body.push_str("\nOnce I have that, I'll get right back to you.");
    body
}
