//! Service layer: retrieval, analysis, formatting, and session control.

pub mod analysis;
pub mod formatter;
pub mod retrieval;
pub mod session;
pub mod structured;
pub mod vocabulary;

pub use analysis::{AnalysisOutcome, CompletionAnalyzer, DraftAssessment};
pub use formatter::ResultFormatter;
pub use retrieval::{ContextSnippet, RetrievalEngine};
pub use session::{SessionCreated, TriageController, TurnOutcome};
