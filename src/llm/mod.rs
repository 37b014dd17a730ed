//! Text-generation boundary.
//!
//! The pipeline is agnostic to the concrete provider: every stage calls the
//! [`LlmProvider`] trait, and the only shipped implementation speaks the
//! OpenAI-compatible chat-completion format over HTTP.

pub mod openai;
pub mod provider;
pub mod structured;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};
