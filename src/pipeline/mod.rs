//! The response pipeline: classify, draft, validate, resolve.

pub mod classifier;
pub mod orchestrator;
pub mod types;
pub mod validator;

pub use classifier::Classifier;
pub use orchestrator::ResponseOrchestrator;
pub use types::{
    AuditTrail, Category, Classification, DraftResult, EvidenceItem, FinalResponse,
    GroundingResult, MeetingProposal, Message, ResponseOutcome, SanitizedText,
};
pub use validator::GroundingValidator;
