//! The `LlmProvider` trait and completion request/response types.
//!
//! Every pipeline stage that talks to the text-generation service goes
//! through this boundary, so tests can substitute a scripted provider
//! instead of asserting on live model output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// "system", "user", or "assistant".
    pub role: String,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a message with role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// A completion request sent to an LLM provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0 = deterministic).
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a minimal request from messages.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural stop.
    Stop,
    /// Token budget exhausted.
    Length,
    /// Anything else the provider reports.
    Other,
}

/// A completion response from an LLM provider.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Tokens in the prompt.
    pub input_tokens: u32,
    /// Tokens generated.
    pub output_tokens: u32,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
    /// Provider-assigned response id, if any.
    pub response_id: Option<String>,
}

/// A provider that can execute completion requests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier used for logging.
    fn model_name(&self) -> &str;

    /// Execute a completion request and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_helpers() {
        let sys = ChatMessage::system("You are a drafting assistant.");
        assert_eq!(sys.role, "system");
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn completion_request_builder() {
        let req = CompletionRequest::new(vec![ChatMessage::user("Hi")])
            .with_temperature(0.1)
            .with_max_tokens(256);
        assert_eq!(req.temperature, Some(0.1));
        assert_eq!(req.max_tokens, Some(256));
        assert_eq!(req.messages.len(), 1);
    }
}
