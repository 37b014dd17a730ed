//! Automated reply drafting with factual grounding.
//!
//! Every inbound message flows through one pipeline: a classifier picks a
//! response policy, the policy drafts a reply (from the message plus
//! sanitized external evidence, when applicable), and a grounding validator
//! checks every concrete claim in the draft against the trusted sources.
//! Ungrounded drafts get one revision pass; after that the orchestrator
//! falls back to a disclaimer wrap, a clarifying question, or a templated
//! apology. The pipeline always produces a sendable response.
//!
//! Entry point: [`pipeline::ResponseOrchestrator::process`].

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod policy;
pub mod safety;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::ResponseOrchestrator;
