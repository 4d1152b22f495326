use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use maiko_core::{
    ChatMessage, FinishReason, LLMConfig, LLMError, LLMFeature, LLMProvider, LLMResponse,
    TokenUsage,
};

/// Mock LLM provider for testing
///
/// Clones share state, so a test can keep one handle for assertions while
/// the engine under test owns another.
#[derive(Clone)]
pub struct MockLLMProvider {
    name: String,
    inner: Arc<RwLock<MockLLMProviderInner>>,
}

struct MockLLMProviderInner {
    responses: Vec<LLMResponse>,
    response_index: usize,
    cycle_responses: bool,
    call_history: Vec<MockCall>,
    should_error: bool,
    error_message: String,
    latency_ms: u64,
    features: Vec<LLMFeature>,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub messages: Vec<ChatMessage>,
    pub config: Option<LLMConfig>,
    pub timestamp: std::time::Instant,
}

impl MockCall {
    /// Content of the last message in the request.
    pub fn prompt(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or("")
    }
}

impl MockLLMProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(RwLock::new(MockLLMProviderInner {
                responses: Vec::new(),
                response_index: 0,
                cycle_responses: false,
                call_history: Vec::new(),
                should_error: false,
                error_message: "Mock error".to_string(),
                latency_ms: 0,
                features: vec![LLMFeature::SystemMessages],
            })),
        }
    }

    pub fn set_feature_support(&mut self, feature: LLMFeature, supported: bool) {
        let mut inner = self.inner.write();
        if supported {
            if !inner.features.contains(&feature) {
                inner.features.push(feature);
            }
        } else {
            inner.features.retain(|f| f != &feature);
        }
    }

    pub fn set_response(&mut self, response: impl Into<String>) {
        self.set_responses(vec![response.into()], false);
    }

    pub fn set_responses(&mut self, responses: Vec<String>, cycle: bool) {
        let mut inner = self.inner.write();
        inner.responses = responses
            .into_iter()
            .map(|content| LLMResponse::new(content, FinishReason::Stop))
            .collect();
        inner.response_index = 0;
        inner.cycle_responses = cycle;
    }

    pub fn set_error(&mut self, error_message: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.should_error = true;
        inner.error_message = error_message.into();
    }

    pub fn clear_error(&mut self) {
        self.inner.write().should_error = false;
    }

    pub fn set_latency(&mut self, latency_ms: u64) {
        self.inner.write().latency_ms = latency_ms;
    }

    pub fn call_count(&self) -> usize {
        self.inner.read().call_history.len()
    }

    pub fn call_history(&self) -> Vec<MockCall> {
        self.inner.read().call_history.clone()
    }

    pub fn last_call(&self) -> Option<MockCall> {
        self.inner.read().call_history.last().cloned()
    }

    pub fn clear_history(&mut self) {
        self.inner.write().call_history.clear();
    }

    pub fn reset(&mut self) {
        let mut inner = self.inner.write();
        inner.responses.clear();
        inner.response_index = 0;
        inner.cycle_responses = false;
        inner.call_history.clear();
        inner.should_error = false;
        inner.error_message = "Mock error".to_string();
        inner.latency_ms = 0;
    }

    fn get_next_response(&self) -> LLMResponse {
        let mut inner = self.inner.write();

        if inner.responses.is_empty() {
            return LLMResponse::new("Mock response", FinishReason::Stop).with_model("mock-model");
        }

        let response = inner.responses[inner.response_index].clone();
        if inner.cycle_responses {
            inner.response_index = (inner.response_index + 1) % inner.responses.len();
        } else if inner.response_index < inner.responses.len() - 1 {
            inner.response_index += 1;
        }
        response
    }

    fn record_call(&self, messages: &[ChatMessage], config: Option<&LLMConfig>) {
        self.inner.write().call_history.push(MockCall {
            messages: messages.to_vec(),
            config: config.cloned(),
            timestamp: std::time::Instant::now(),
        });
    }

    async fn simulate_latency(&self) {
        let latency_ms = self.inner.read().latency_ms;
        if latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(latency_ms)).await;
        }
    }

    fn estimate_tokens(messages: &[ChatMessage]) -> u32 {
        let total_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        (total_chars / 4) as u32
    }
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError> {
        self.record_call(messages, config);
        self.simulate_latency().await;

        {
            let inner = self.inner.read();
            if inner.should_error {
                return Err(LLMError::Other(inner.error_message.clone()));
            }
        }

        let mut response = self.get_next_response();

        if response.usage.is_none() {
            let prompt_tokens = Self::estimate_tokens(messages);
            let completion_tokens = (response.content.len() / 4) as u32;
            response.usage = Some(TokenUsage::new(prompt_tokens, completion_tokens));
        }

        Ok(response)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn supports(&self, feature: LLMFeature) -> bool {
        self.inner.read().features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_basic() {
        let mut mock = MockLLMProvider::new("test");

        mock.set_response("Mock response");
        let messages = vec![ChatMessage::user("Hello")];
        let response = mock.complete(&messages, None).await.unwrap();
        assert_eq!(response.content, "Mock response");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(mock.provider_name(), "test");
    }

    #[tokio::test]
    async fn test_multiple_responses() {
        let mut mock = MockLLMProvider::new("test");
        mock.set_responses(
            vec![
                "First".to_string(),
                "Second".to_string(),
                "Third".to_string(),
            ],
            false,
        );

        let messages = vec![ChatMessage::user("Hello")];

        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "First");
        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "Second");
        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "Third");
        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "Third");
    }

    #[tokio::test]
    async fn test_cycle_responses() {
        let mut mock = MockLLMProvider::new("test");
        mock.set_responses(vec!["A".to_string(), "B".to_string()], true);

        let messages = vec![ChatMessage::user("Hello")];

        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "A");
        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "B");
        assert_eq!(mock.complete(&messages, None).await.unwrap().content, "A");
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mut mock = MockLLMProvider::new("test");
        mock.set_error("Test error");

        let result = mock.complete(&[ChatMessage::user("Hello")], None).await;
        assert!(result.unwrap_err().to_string().contains("Test error"));

        mock.clear_error();
        assert!(mock.complete(&[ChatMessage::user("Hello")], None).await.is_ok());
    }

    #[tokio::test]
    async fn test_call_history_shared_between_clones() {
        let mut mock = MockLLMProvider::new("test");
        mock.set_response("ok");
        let handle = mock.clone();

        mock.complete_text("First").await.unwrap();
        mock.complete_text("Second").await.unwrap();

        assert_eq!(handle.call_count(), 2);
        assert_eq!(handle.last_call().unwrap().prompt(), "Second");

        mock.clear_history();
        assert_eq!(handle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let mut mock = MockLLMProvider::new("test");
        mock.set_response("Custom");
        mock.set_error("Error");
        mock.set_latency(10);
        let _ = mock.complete_text("Hello").await;

        mock.reset();

        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.complete_text("Hello").await.unwrap(), "Mock response");
    }

    #[tokio::test]
    async fn test_token_estimation() {
        let mut mock = MockLLMProvider::new("test");
        mock.set_response("test");
        let messages = vec![
            ChatMessage::user("Hello world"),
            ChatMessage::assistant("Hi there"),
        ];

        let usage = mock.complete(&messages, None).await.unwrap().usage.unwrap();
        assert!(usage.prompt_tokens > 0);
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }

    #[test]
    fn test_feature_support() {
        let mut mock = MockLLMProvider::new("test");
        assert!(!mock.supports(LLMFeature::Vision));
        mock.set_feature_support(LLMFeature::Vision, true);
        assert!(mock.supports(LLMFeature::Vision));
    }
}
