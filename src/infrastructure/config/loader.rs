use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid generation backend: {0}. Must be one of: anthropic, mock")]
    InvalidGenerationBackend(String),

    #[error("Invalid embedding backend: {0}. Must be one of: openai, mock")]
    InvalidEmbeddingBackend(String),

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid top_k: {0}. Must be at least 1")]
    InvalidTopK(usize),

    #[error("Invalid max_user_turns: {0}. Must be at least 1")]
    InvalidMaxUserTurns(usize),

    #[error(
        "Invalid context budget: min_partial_chars ({0}) must not exceed max_context_chars ({1})"
    )]
    InvalidContextBudget(usize, usize),

    #[error("Invalid lexical_weight: {0}. Must be between 0.0 and 1.0")]
    InvalidLexicalWeight(f32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .medtriage/config.yaml (project config)
    /// 3. .medtriage/local.yaml (project local overrides, optional)
    /// 4. Environment variables (`MEDTRIAGE_`* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".medtriage/config.yaml"))
            .merge(Yaml::file(".medtriage/local.yaml"))
            .merge(Env::prefixed("MEDTRIAGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        match config.generation.backend.as_str() {
            "anthropic" | "mock" => {}
            other => return Err(ConfigError::InvalidGenerationBackend(other.to_string())),
        }

        match config.embedding.backend.as_str() {
            "openai" | "mock" => {}
            other => return Err(ConfigError::InvalidEmbeddingBackend(other.to_string())),
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(config.embedding.dimension));
        }

        if config.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidTopK(config.retrieval.top_k));
        }

        if config.retrieval.min_partial_chars > config.retrieval.max_context_chars {
            return Err(ConfigError::InvalidContextBudget(
                config.retrieval.min_partial_chars,
                config.retrieval.max_context_chars,
            ));
        }

        if !(0.0..=1.0).contains(&config.retrieval.lexical_weight) {
            return Err(ConfigError::InvalidLexicalWeight(
                config.retrieval.lexical_weight,
            ));
        }

        if config.session.max_user_turns == 0 {
            return Err(ConfigError::InvalidMaxUserTurns(
                config.session.max_user_turns,
            ));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::InvalidLogLevel(other.to_string())),
        }

        match config.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        }

        Ok(())
    }
}
