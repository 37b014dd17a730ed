//! Configuration types.

use std::time::Duration;

/// Pipeline configuration.
///
/// Passed to the orchestrator at construction time. The binary resolves
/// environment overrides; the library only sees the resolved struct.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Timezone applied when a meeting proposal omits one.
    pub default_timezone: String,
    /// Meeting duration applied when a proposal omits one.
    pub default_meeting_duration_minutes: u32,
    /// Advisory classification confidence floor. Below this the decision is
    /// logged at `warn` but routing still follows the classifier's choice.
    pub confidence_floor: f32,
    /// Deadline for each text-generation call. A timeout is handled the same
    /// way as a malformed response (conservative fallback).
    pub llm_timeout: Duration,
    /// Max tokens for the classification call (runs on every message).
    pub classify_max_tokens: u32,
    /// Max tokens for drafting and validation calls.
    pub draft_max_tokens: u32,
    /// Temperature for classification and validation (deterministic-ish).
    pub analysis_temperature: f32,
    /// Temperature for drafting.
    pub draft_temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            default_meeting_duration_minutes: 30,
            confidence_floor: 0.4,
            llm_timeout: Duration::from_secs(30),
            classify_max_tokens: 512,
            draft_max_tokens: 1536,
            analysis_temperature: 0.1,
            draft_temperature: 0.7,
        }
    }
}
