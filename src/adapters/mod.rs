//! Concrete provider implementations.

pub mod anthropic;
pub mod error;
pub mod mock;
pub mod openai_embeddings;

pub use anthropic::AnthropicProvider;
pub use error::ProviderApiError;
pub use mock::{MockEmbeddingProvider, MockGenerationProvider, MockReply};
pub use openai_embeddings::OpenAiEmbeddingProvider;
