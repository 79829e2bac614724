//! Mock providers for testing.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::Message;
use crate::domain::ports::{
    EmbeddingInput, EmbeddingOutput, EmbeddingProvider, GenerationProvider,
};
use crate::services::structured;

/// A scripted generation step.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail with a generation error carrying this message.
    Failure(String),
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Text(content.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        MockReply::Failure(message.into())
    }
}

/// Generation provider that replays a scripted queue of replies.
///
/// Replies are consumed in call order across both `generate` and
/// `generate_structured`; an exhausted queue yields a fixed placeholder
/// reply so tests fail on content rather than panicking.
pub struct MockGenerationProvider {
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<u32>,
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
        }
    }

    pub fn with_script<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = MockReply>,
    {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    /// Append a reply to the script.
    pub fn push(&self, reply: MockReply) {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(reply);
    }

    /// Total provider calls made so far.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().expect("mock call counter lock poisoned")
    }

    fn next_reply(&self) -> DomainResult<String> {
        *self.calls.lock().expect("mock call counter lock poisoned") += 1;
        let next = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front();
        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(message)) => Err(TriageError::Generation(message)),
            None => Ok("mock reply".to_string()),
        }
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, _system_prompt: &str, _history: &[Message]) -> DomainResult<String> {
        self.next_reply()
    }

    async fn generate_structured(
        &self,
        _system_prompt: &str,
        _history: &[Message],
        _schema_instruction: &str,
    ) -> DomainResult<serde_json::Value> {
        let text = self.next_reply()?;
        structured::parse_value(&text)
    }
}

/// Deterministic embedding provider for tests.
///
/// Produces a normalized bag-of-words vector: every word hashes to a
/// dimension, so texts sharing words land near each other under cosine
/// similarity without any model in the loop.
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();
            let slot = (hash as usize) % self.dimension;
            let sign = if hash & (1_u64 << 63) == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Ok(inputs
            .iter()
            .map(|input| EmbeddingOutput {
                id: input.id.clone(),
                vector: self.embed_sync(&input.text),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::vector::cosine_similarity;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let provider = MockGenerationProvider::with_script([
            MockReply::text("first"),
            MockReply::failure("boom"),
        ]);

        assert_eq!(provider.generate("", &[]).await.unwrap(), "first");
        let err = provider.generate("", &[]).await.unwrap_err();
        assert!(matches!(err, TriageError::Generation(_)));
        assert_eq!(provider.generate("", &[]).await.unwrap(), "mock reply");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_structured_parses_scripted_json() {
        let provider =
            MockGenerationProvider::with_script([MockReply::text(r#"{"can_complete": false}"#)]);
        let value = provider.generate_structured("", &[], "").await.unwrap();
        assert_eq!(value["can_complete"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_structured_unparseable_is_parse_error() {
        let provider =
            MockGenerationProvider::with_script([MockReply::text("sorry, no json here")]);
        let err = provider.generate_structured("", &[], "").await.unwrap_err();
        assert!(matches!(err, TriageError::Parse(_)));
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic_and_word_sensitive() {
        let provider = MockEmbeddingProvider::new(16);

        let a = provider.embed("fever and chills").await.unwrap();
        let b = provider.embed("fever and chills").await.unwrap();
        assert_eq!(a, b);

        let related = provider.embed("high fever").await.unwrap();
        let unrelated = provider.embed("sprained ankle").await.unwrap();
        assert!(cosine_similarity(&a, &related) > cosine_similarity(&a, &unrelated));
    }
}
