//! Provider construction from configuration.
//!
//! Backend selection happens exactly once, here; the rest of the engine
//! only ever sees the capability traits.

use std::sync::Arc;

use crate::adapters::{
    AnthropicProvider, MockEmbeddingProvider, MockGenerationProvider, OpenAiEmbeddingProvider,
};
use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::Config;
use crate::domain::ports::{EmbeddingProvider, GenerationProvider};
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::store::InMemorySessionStore;
use crate::infrastructure::vector::VectorIndex;
use crate::services::{RetrievalEngine, TriageController};

/// Build the generation provider selected by the configuration.
pub fn build_generation_provider(config: &Config) -> DomainResult<Arc<dyn GenerationProvider>> {
    let retry_policy = RetryPolicy::from(&config.retry);
    match config.generation.backend.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(
            config.generation.clone(),
            retry_policy,
        )?)),
        "mock" => Ok(Arc::new(MockGenerationProvider::new())),
        other => Err(TriageError::Config(format!(
            "unknown generation backend: {other}"
        ))),
    }
}

/// Build the embedding provider selected by the configuration.
pub fn build_embedding_provider(config: &Config) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    let retry_policy = RetryPolicy::from(&config.retry);
    match config.embedding.backend.as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbeddingProvider::new(
            config.embedding.clone(),
            retry_policy,
        )?)),
        "mock" => Ok(Arc::new(MockEmbeddingProvider::new(
            config.embedding.dimension,
        ))),
        other => Err(TriageError::Config(format!(
            "unknown embedding backend: {other}"
        ))),
    }
}

/// Assemble a fully wired controller plus the index it retrieves from.
///
/// The index handle is returned separately so the corpus ingestion path can
/// write to it while sessions read through the controller.
pub fn build_engine(config: &Config) -> DomainResult<(TriageController, Arc<VectorIndex>)> {
    let embedder = build_embedding_provider(config)?;
    let generator = build_generation_provider(config)?;
    let index = Arc::new(VectorIndex::new(config.embedding.dimension));

    let retrieval = Arc::new(RetrievalEngine::new(
        Arc::clone(&embedder),
        Arc::clone(&index),
        config.retrieval.clone(),
    ));

    let controller = TriageController::new(
        Arc::new(InMemorySessionStore::new()),
        retrieval,
        generator,
        config.session.clone(),
    );

    Ok((controller, index))
}
