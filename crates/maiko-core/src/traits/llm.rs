//! LLM provider traits

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::message::ChatMessage;
use crate::types::{LLMConfig, LLMFeature, LLMResponse};

/// Core LLM provider trait
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError>;

    fn provider_name(&self) -> &str;

    fn supports(&self, feature: LLMFeature) -> bool;

    /// Send a single user prompt and return the trimmed completion text.
    async fn complete_text(&self, prompt: &str) -> Result<String, LLMError> {
        let messages = [ChatMessage::user(prompt)];
        let response = self.complete(&messages, None).await?;
        Ok(response.content.trim().to_string())
    }
}

/// LLM error types
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API error: {message}")]
    API {
        message: String,
        status: Option<u16>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limit exceeded: {retry_after:?}")]
    RateLimit { retry_after: Option<Duration> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::Serialization(err.to_string())
    }
}
