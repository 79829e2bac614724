//! Domain models for the triage engine.

pub mod chunk;
pub mod config;
pub mod result;
pub mod session;

pub use chunk::{KnowledgeChunk, RetrievalResult};
pub use config::{
    Config, EmbeddingConfig, GenerationConfig, LoggingConfig, RetrievalConfig, RetryConfig,
    SessionConfig,
};
pub use result::{SourceAttribution, TriageAssessment, UrgencyLevel, DISCLAIMER};
pub use session::{Message, MessageRole, PatientContext, SessionStatus, TriageSession};
