//! Medtriage - grounded medical triage reasoning engine
//!
//! Medtriage conducts a multi-turn symptom interview and produces an urgency
//! classification with recommended next steps, grounded in retrieved medical
//! reference text rather than free-form model knowledge. It never asserts a
//! diagnosis.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, error taxonomy, and capability ports
//! - **Service Layer** (`services`): Retrieval engine, completion analysis,
//!   result formatting, and the session controller
//! - **Adapter Layer** (`adapters`): Provider implementations (Anthropic
//!   generation, OpenAI-compatible embeddings, test mocks)
//! - **Infrastructure Layer** (`infrastructure`): Vector index, session
//!   store, retry policy, configuration, and wiring
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use medtriage::domain::models::{Config, PatientContext};
//! use medtriage::infrastructure::build_engine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (controller, _index) = build_engine(&Config::default())?;
//!     let created = controller
//!         .create_session(PatientContext::new("chest pain"))
//!         .await?;
//!     println!("{}", created.opening_question);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainResult, TriageError};
pub use domain::models::{
    Config, KnowledgeChunk, Message, MessageRole, PatientContext, RetrievalResult, SessionStatus,
    TriageAssessment, TriageSession, UrgencyLevel,
};
pub use domain::ports::{EmbeddingProvider, GenerationProvider, SessionStore};
pub use infrastructure::{
    build_engine, ConfigLoader, InMemorySessionStore, RetryPolicy, VectorIndex,
};
pub use services::{RetrievalEngine, TriageController, TurnOutcome};
