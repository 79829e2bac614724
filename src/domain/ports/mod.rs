//! Capability ports implemented by adapters and infrastructure.

pub mod embedding;
pub mod generation;
pub mod session_store;

pub use embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use generation::GenerationProvider;
pub use session_store::SessionStore;
