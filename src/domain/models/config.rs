use serde::{Deserialize, Serialize};

/// Main configuration structure for the triage engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Generation provider configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval engine configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session controller configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Provider backend: anthropic or mock
    #[serde(default = "default_generation_backend")]
    pub backend: String,

    /// API key. Falls back to the provider's env var when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API version header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max tokens to generate per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_generation_backend() -> String {
    "anthropic".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_generation_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_tokens() -> u32 {
    1024
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_generation_backend(),
            api_key: None,
            base_url: default_anthropic_base_url(),
            model: default_generation_model(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Provider backend: openai or mock
    #[serde(default = "default_embedding_backend")]
    pub backend: String,

    /// API key. Falls back to the provider's env var when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum texts per single API request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_embedding_backend() -> String {
    "openai".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_dimension() -> usize {
    1536
}

const fn default_max_batch_size() -> usize {
    2048
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Retrieval engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Number of chunks to return per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Over-fetch multiplier applied before filtering and reranking
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Character budget for the retrieved context string
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Minimum remaining budget for which a chunk is included truncated
    /// rather than dropped
    #[serde(default = "default_min_partial_chars")]
    pub min_partial_chars: usize,

    /// Weight of the lexical term-overlap score relative to vector
    /// similarity when reranking (0.0 - 1.0)
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,
}

const fn default_top_k() -> usize {
    4
}

const fn default_overfetch_factor() -> usize {
    2
}

const fn default_max_context_chars() -> usize {
    4000
}

const fn default_min_partial_chars() -> usize {
    200
}

const fn default_lexical_weight() -> f32 {
    0.3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            overfetch_factor: default_overfetch_factor(),
            max_context_chars: default_max_context_chars(),
            min_partial_chars: default_min_partial_chars(),
            lexical_weight: default_lexical_weight(),
        }
    }
}

/// Session controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Maximum user turns before finalization is forced
    #[serde(default = "default_max_user_turns")]
    pub max_user_turns: usize,
}

const fn default_max_user_turns() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_user_turns: default_max_user_turns(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retries before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff duration in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
