//! Summarizer trait and implementations for conversation archival

use std::sync::Arc;

use async_trait::async_trait;

use maiko_core::{LLMProvider, Result};

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the digest of the conversation identified by `label`.
    async fn summarize(&self, label: &str, digest: &str) -> Result<String>;
}

pub struct LLMSummarizer {
    llm: Arc<dyn LLMProvider>,
    prompt_template: String,
}

impl LLMSummarizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            llm,
            prompt_template: DEFAULT_SUMMARY_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_template = prompt.into();
        self
    }
}

#[async_trait]
impl Summarizer for LLMSummarizer {
    async fn summarize(&self, label: &str, digest: &str) -> Result<String> {
        let prompt = self
            .prompt_template
            .replace("{label}", label)
            .replace("{digest}", digest);

        Ok(self.llm.complete_text(&prompt).await?)
    }
}

pub const DEFAULT_SUMMARY_PROMPT: &str = r#"Summarize this conversation from {label} in 3 short bullet points.

{digest}

Summary:"#;

/// Uses the digest itself as the summary. For setups without a background model.
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _label: &str, digest: &str) -> Result<String> {
        Ok(digest.to_string())
    }
}
