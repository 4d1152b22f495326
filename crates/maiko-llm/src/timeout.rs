//! Bounded-time wrapper around any provider

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use maiko_core::{ChatMessage, LLMConfig, LLMError, LLMFeature, LLMProvider, LLMResponse};

/// Fails a request with [`LLMError::Timeout`] once `timeout` elapses.
///
/// The inner future is dropped on timeout; no retry is attempted.
pub struct TimeoutProvider {
    inner: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl LLMProvider for TimeoutProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(messages, config)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = self.inner.provider_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "LLM request timed out"
                );
                Err(LLMError::Timeout(self.timeout))
            }
        }
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn supports(&self, feature: LLMFeature) -> bool {
        self.inner.supports(feature)
    }
}
