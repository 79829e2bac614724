//! OpenAI-compatible embedding provider.
//!
//! Calls the `/v1/embeddings` endpoint; compatible with any server speaking
//! the same protocol (Azure OpenAI, local inference servers). Requests are
//! retried on transient failures with the shared backoff policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapters::error::ProviderApiError;
use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
use crate::infrastructure::retry::RetryPolicy;

/// Embedding provider backed by an OpenAI-compatible embeddings API.
pub struct OpenAiEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: EmbeddingConfig, retry_policy: RetryPolicy) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            retry_policy,
        })
    }

    fn api_key(&self) -> Result<String, ProviderApiError> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ProviderApiError::InvalidRequest(
                    "OPENAI_API_KEY not set and no api_key configured".to_string(),
                )
            })
    }

    async fn call_embeddings_api(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, ProviderApiError> {
        let api_key = self.api_key()?;
        let url = format!("{}/embeddings", self.config.base_url);

        let request_body = EmbeddingsRequest {
            model: self.config.model.clone(),
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderApiError::Timeout
                } else {
                    ProviderApiError::NetworkError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(ProviderApiError::from_status(status, body));
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| ProviderApiError::MalformedResponse(e.to_string()))?;

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    async fn embed_texts(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let vectors = self
            .retry_policy
            .execute(|| self.call_embeddings_api(texts.clone()))
            .await
            .map_err(|e| TriageError::Embedding(e.to_string()))?;

        for vector in &vectors {
            if vector.len() != self.config.dimension {
                return Err(TriageError::DimensionMismatch {
                    expected: self.config.dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(TriageError::Embedding(
                "cannot embed empty text".to_string(),
            ));
        }

        let vectors = self.embed_texts(vec![text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::Embedding("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_outputs = Vec::with_capacity(inputs.len());

        // Chunk by max_batch_size
        for batch in inputs.chunks(self.config.max_batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|i| i.text.clone()).collect();
            let vectors = self.embed_texts(texts).await?;

            for (input, vector) in batch.iter().zip(vectors) {
                all_outputs.push(EmbeddingOutput {
                    id: input.id.clone(),
                    vector,
                });
            }
        }

        Ok(all_outputs)
    }
}

// -- API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
