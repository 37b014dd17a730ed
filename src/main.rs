//! One-shot pipeline runner.
//!
//! Reads a JSON request from stdin, runs it through the pipeline, and prints
//! the final response as JSON. Useful for wiring into a transport layer or
//! poking at the pipeline by hand:
//!
//! ```text
//! echo '{"message": {...}, "evidence": []}' | OPENAI_API_KEY=sk-... reply-guard
//! ```

use std::io::Read;

use anyhow::Context;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use reply_guard::config::PipelineConfig;
use reply_guard::error::ConfigError;
use std::sync::Arc;

use reply_guard::llm::{LlmProvider, OpenAiConfig, OpenAiProvider};
use reply_guard::pipeline::types::{EvidenceItem, Message};
use reply_guard::pipeline::ResponseOrchestrator;

#[derive(Deserialize)]
struct Request {
    message: Message,
    #[serde(default)]
    evidence: Vec<EvidenceItem>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let provider_config = openai_config_from_env()?;
    tracing::info!(model = %provider_config.model, "Using OpenAI-compatible provider");
    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(provider_config));

    let mut config = PipelineConfig::default();
    if let Ok(tz) = std::env::var("REPLY_TIMEZONE") {
        config.default_timezone = tz;
    }

    let orchestrator = ResponseOrchestrator::new(llm, config);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading request from stdin")?;
    let request: Request = serde_json::from_str(&input).context("parsing request JSON")?;

    let response = orchestrator.process(&request.message, request.evidence).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn openai_config_from_env() -> Result<OpenAiConfig, ConfigError> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
    Ok(OpenAiConfig {
        base_url: std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        api_key: api_key.into(),
        model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
    })
}
