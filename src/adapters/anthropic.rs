//! Anthropic generation provider.
//!
//! Makes direct HTTP calls to the Anthropic Messages API. Transient
//! failures (429, 5xx, timeouts) are retried with exponential backoff;
//! client errors propagate immediately.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use crate::adapters::error::ProviderApiError;
use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::{GenerationConfig, Message as ChatMessage, MessageRole};
use crate::domain::ports::GenerationProvider;
use crate::infrastructure::retry::RetryPolicy;
use crate::services::structured;

/// Message role in the Anthropic API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiRole {
    User,
    Assistant,
}

/// Content block in a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiMessage {
    role: ApiRole,
    content: Vec<ContentBlock>,
}

/// Request to the Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
}

/// Response from the Messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// Generation provider backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    config: GenerationConfig,
    client: Client,
    retry_policy: RetryPolicy,
}

impl AnthropicProvider {
    pub fn new(config: GenerationConfig, retry_policy: RetryPolicy) -> DomainResult<Self> {
        let client = Client::builder()
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
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                ProviderApiError::InvalidRequest(
                    "ANTHROPIC_API_KEY not set and no api_key configured".to_string(),
                )
            })
    }

    /// Map conversation history onto the API message array. System messages
    /// are carried separately in the `system` field, so they are skipped
    /// here; the array must alternate starting from a user turn, which the
    /// session controller's append discipline guarantees.
    fn build_messages(history: &[ChatMessage]) -> Vec<ApiMessage> {
        history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| ApiMessage {
                role: match m.role {
                    MessageRole::Assistant => ApiRole::Assistant,
                    _ => ApiRole::User,
                },
                content: vec![ContentBlock::Text {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }

    async fn call_messages_api(
        &self,
        system_prompt: &str,
        messages: Vec<ApiMessage>,
    ) -> Result<String, ProviderApiError> {
        let api_key = self.api_key()?;

        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: if system_prompt.is_empty() {
                None
            } else {
                Some(system_prompt.to_string())
            },
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&request)
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
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderApiError::from_status(status, body));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderApiError::MalformedResponse(e.to_string()))?;

        let text = result
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(text)
    }

    async fn generate_with_retry(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> DomainResult<String> {
        let messages = Self::build_messages(history);
        self.retry_policy
            .execute(|| self.call_messages_api(system_prompt, messages.clone()))
            .await
            .map_err(|e| TriageError::Generation(e.to_string()))
    }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> DomainResult<String> {
        self.generate_with_retry(system_prompt, history).await
    }

    async fn generate_structured(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        schema_instruction: &str,
    ) -> DomainResult<serde_json::Value> {
        let mut augmented: Vec<ChatMessage> = history.to_vec();
        augmented.push(ChatMessage::user(schema_instruction));

        let text = self.generate_with_retry(system_prompt, &augmented).await?;
        structured::parse_value(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> AnthropicProvider {
        let config = GenerationConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
            ..GenerationConfig::default()
        };
        AnthropicProvider::new(config, RetryPolicy::new(1, 10, 20)).unwrap()
    }

    #[test]
    fn test_build_messages_skips_system_role() {
        let history = vec![
            ChatMessage::system("policy"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi, what brings you in?"),
        ];
        let messages = AnthropicProvider::build_messages(&history);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0].role, ApiRole::User));
        assert!(matches!(messages[1].role, ApiRole::Assistant));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_permanent_error() {
        let config = GenerationConfig {
            api_key: None,
            base_url: "http://127.0.0.1:1".to_string(),
            ..GenerationConfig::default()
        };
        let provider = AnthropicProvider::new(config, RetryPolicy::new(1, 10, 20)).unwrap();

        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            return; // environment provides a key; nothing to assert
        }
        let err = provider.generate("", &[ChatMessage::user("hi")]).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_generate_extracts_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(
                r#"{"content": [{"type": "text", "text": "How long has this been going on?"}]}"#,
            )
            .create_async()
            .await;

        let provider = provider(&server.url());
        let reply = provider
            .generate("system", &[ChatMessage::user("my head hurts")])
            .await
            .unwrap();

        assert_eq!(reply, "How long has this been going on?");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_retried_until_budget_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(503)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let provider = provider(&server.url());
        let err = provider
            .generate("", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::Generation(_)));
        // One retry configured, so the endpoint is hit exactly twice
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body("bad request")
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server.url());
        let err = provider
            .generate("", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::Generation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_structured_parses_wrapped_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                r#"{"content": [{"type": "text", "text": "Here you go:\n{\"can_complete\": true}"}]}"#,
            )
            .create_async()
            .await;

        let provider = provider(&server.url());
        let value = provider
            .generate_structured("", &[ChatMessage::user("analyze")], "respond with json")
            .await
            .unwrap();

        assert_eq!(value["can_complete"], serde_json::json!(true));
    }
}
