//! Error types for reply-guard.

use std::time::Duration;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Text-generation boundary errors.
///
/// `RateLimited` and `Timeout` are the "service unavailable" family; every
/// pipeline stage treats them identically to a malformed-output failure and
/// falls back to its documented conservative substitute.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Pipeline-stage errors.
///
/// Drafting is the only stage that surfaces a typed error: the classifier
/// and validator recover internally (GENERAL fallback, fail-closed
/// grounding), and the orchestrator converts a drafting failure into the
/// templated apology. Nothing escapes `ResponseOrchestrator::process`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Drafting failed: {0}")]
    Drafting(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
