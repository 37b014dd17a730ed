//! Shared types for the response pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Inbound message ─────────────────────────────────────────────────

/// An inbound message handed to the pipeline by the transport layer.
///
/// Immutable once received — no pipeline stage mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique ID (transport-native or generated UUID).
    pub id: String,
    /// Sender identifier (email address, handle).
    pub sender: String,
    /// Recipient identifiers.
    pub recipients: Vec<String>,
    /// Subject line, if the transport has one.
    pub subject: Option<String>,
    /// Plain-text body.
    pub body: String,
    /// Thread-reference id for reply threading.
    pub thread_ref: Option<String>,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

// ── Classification ──────────────────────────────────────────────────

/// Response-policy category for an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Meeting requests, availability, time coordination.
    Scheduling,
    /// Sales, support, negotiations, partnerships.
    Business,
    /// Factual questions needing research-backed answers.
    Information,
    /// Everything else. Also the failure fallback.
    General,
}

impl Category {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduling => "scheduling",
            Self::Business => "business",
            Self::Information => "information",
            Self::General => "general",
        }
    }

    /// Parse a classifier label. Unknown labels are rejected so the caller
    /// can apply its failure fallback.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "scheduling" => Some(Self::Scheduling),
            "business" => Some(Self::Business),
            "information" => Some(Self::Information),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Classifier output for one message. Produced once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Selected category.
    pub category: Category,
    /// Confidence in [0, 1]. Advisory — never blocks routing.
    pub confidence: f32,
    /// Free-text reasoning from the classifier.
    pub rationale: String,
}

// ── Evidence ────────────────────────────────────────────────────────

/// One piece of untrusted external content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Raw text as retrieved. Untrusted until sanitized.
    pub text: String,
    /// Where this came from (URL, document id).
    pub source_id: String,
}

/// Evidence text after sanitization. The only form of external content
/// that drafting policies and the validator ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedText {
    /// Text with high-risk literal tokens redacted.
    pub text: String,
    /// Source identifier carried over from the raw evidence.
    pub source_id: String,
}

// ── Draft ───────────────────────────────────────────────────────────

/// A proposed meeting extracted by the scheduling policy.
///
/// Consumed by an external ICS builder; the pipeline only carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingProposal {
    /// Meeting title.
    pub title: String,
    /// Proposed start, local to `timezone`.
    pub start: NaiveDateTime,
    /// Duration in minutes.
    pub duration_minutes: u32,
    /// Timezone name (e.g. "America/New_York", "EST").
    pub timezone: String,
    /// Location if one was mentioned.
    pub location: Option<String>,
}

/// Output of a drafting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftResult {
    /// Draft response body.
    pub body: String,
    /// Side-payload from the scheduling policy, if any.
    pub meeting: Option<MeetingProposal>,
    /// Evidence source ids the draft actually cites.
    pub cited_sources: Vec<String>,
}

// ── Grounding ───────────────────────────────────────────────────────

/// Validator verdict for one draft. Derived, recomputed per draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingResult {
    /// Whether every concrete claim traces to a trusted source.
    pub is_grounded: bool,
    /// Validator confidence in [0, 1].
    pub confidence: f32,
    /// Claims supported verbatim or by paraphrase.
    pub validated_facts: BTreeSet<String>,
    /// Claims with no support in the trusted sources.
    pub unsupported_claims: BTreeSet<String>,
    /// Information the response needs but the sources don't contain.
    pub missing_facts: BTreeSet<String>,
}

impl GroundingResult {
    /// The fail-closed default: not grounded, zero confidence.
    ///
    /// Used whenever the validator's structured response cannot be obtained
    /// or parsed.
    pub fn fail_closed() -> Self {
        Self {
            is_grounded: false,
            confidence: 0.0,
            validated_facts: BTreeSet::new(),
            unsupported_claims: BTreeSet::new(),
            missing_facts: BTreeSet::new(),
        }
    }
}

// ── Final response ──────────────────────────────────────────────────

/// How the orchestrator resolved the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// First draft passed grounding unchanged.
    Approved,
    /// Revised draft passed grounding on the second pass.
    RevisedApproved,
    /// Grounding never passed; best-effort draft wrapped in a disclaimer.
    Disclaimed,
    /// Required information absent; substituted a clarifying question.
    ClarificationRequested,
    /// Drafting failed; substituted a templated apology.
    Unprocessable,
}

impl ResponseOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::RevisedApproved => "revised_approved",
            Self::Disclaimed => "disclaimed",
            Self::ClarificationRequested => "clarification_requested",
            Self::Unprocessable => "unprocessable",
        }
    }

    /// Whether the body is a grounded draft (vs a fallback substitute).
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved | Self::RevisedApproved)
    }
}

/// Audit trail attached to every terminal response for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Pipeline run id.
    pub run_id: uuid::Uuid,
    /// Classification that selected the policy.
    pub classification: Classification,
    /// First-pass grounding verdict (absent if drafting failed).
    pub first_pass: Option<GroundingResult>,
    /// Second-pass verdict after the revision cycle, if one ran.
    pub second_pass: Option<GroundingResult>,
}

/// Terminal output of the pipeline — the only thing the transport layer
/// ever sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResponse {
    /// Approved (or fallback-substituted) response body.
    pub body: String,
    /// Meeting side-payload. Present only on approved outcomes.
    pub meeting: Option<MeetingProposal>,
    /// How the pipeline resolved this message.
    pub outcome: ResponseOutcome,
    /// Full audit trail.
    pub audit: AuditTrail,
}
