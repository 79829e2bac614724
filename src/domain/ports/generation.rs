//! Generation provider port.
//!
//! Language-model backends implement this trait once; the backend is chosen
//! at construction time from configuration, never by branching at call
//! sites.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Message;

/// Trait for language-model generation providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name (e.g., "anthropic", "mock").
    fn name(&self) -> &'static str;

    /// Generate the next assistant utterance given a system instruction and
    /// the conversation history.
    ///
    /// Errors only after the provider's internal retry budget is exhausted or
    /// on a non-retryable failure.
    async fn generate(&self, system_prompt: &str, history: &[Message]) -> DomainResult<String>;

    /// Generate a structured JSON answer to `schema_instruction` given the
    /// conversation history.
    ///
    /// Backends without native structured output implement this by locating
    /// the first well-formed JSON object in the generated text; if none
    /// exists the call fails with a parse error, which callers recover from
    /// locally.
    async fn generate_structured(
        &self,
        system_prompt: &str,
        history: &[Message],
        schema_instruction: &str,
    ) -> DomainResult<serde_json::Value>;
}
