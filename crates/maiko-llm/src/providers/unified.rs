use maiko_core::{
    ChatMessage, FinishReason, ImageMediaType, LLMConfig, LLMError, LLMFeature, LLMProvider,
    LLMResponse, Role, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ZHIPU_BASE_URL: &str = "https://api.z.ai/api/paas/v4/";

/// The two completion backends a chat can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// ZhipuAI GLM, served through an OpenAI-compatible endpoint. Text only.
    #[serde(alias = "glm")]
    Zhipu,
    /// Anthropic Claude. Text and vision.
    #[serde(alias = "claude")]
    Anthropic,
}

impl ProviderType {
    pub const ALL: [ProviderType; 2] = [ProviderType::Zhipu, ProviderType::Anthropic];

    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::Zhipu => "ZHIPUAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Zhipu => Some(ZHIPU_BASE_URL),
            Self::Anthropic => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Zhipu => "glm-4.7-flash",
            Self::Anthropic => "claude-3-5-sonnet-20240620",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zhipu => "zhipu",
            Self::Anthropic => "anthropic",
        }
    }

    /// Human-facing engine name, used in chat error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Zhipu => "GLM",
            Self::Anthropic => "Claude",
        }
    }

    pub fn supports_vision(&self) -> bool {
        matches!(self, Self::Anthropic)
    }

    fn to_llm_backend(&self) -> llm::builder::LLMBackend {
        match self {
            Self::Zhipu => llm::builder::LLMBackend::OpenAI,
            Self::Anthropic => llm::builder::LLMBackend::Anthropic,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zhipu" | "glm" => Ok(Self::Zhipu),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(LLMError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

pub struct UnifiedLLMProvider {
    provider_type: ProviderType,
    model: String,
    api_key: String,
    base_url: Option<String>,
}

impl fmt::Debug for UnifiedLLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedLLMProvider")
            .field("provider_type", &self.provider_type)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl UnifiedLLMProvider {
    pub fn new(
        provider_type: ProviderType,
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, LLMError> {
        let api_key = match api_key {
            Some(key) => key,
            None => {
                let env_var = provider_type.api_key_env_var();
                std::env::var(env_var).map_err(|_| {
                    LLMError::Config(format!(
                        "API key not found in environment variable {}",
                        env_var
                    ))
                })?
            }
        };

        if api_key.trim().is_empty() {
            return Err(LLMError::Config(format!(
                "Empty API key for provider {}",
                provider_type
            )));
        }

        let base_url = base_url.or_else(|| provider_type.default_base_url().map(String::from));

        Ok(Self {
            provider_type,
            model,
            api_key,
            base_url,
        })
    }

    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// An attached image becomes its own image-only turn ahead of the text turn.
    fn convert_message(&self, msg: &ChatMessage) -> Vec<llm::chat::ChatMessage> {
        let builder = || match msg.role {
            Role::Assistant => llm::chat::ChatMessage::assistant(),
            Role::System | Role::User => llm::chat::ChatMessage::user(),
        };
        let text = builder().content(&msg.content).build();

        match &msg.attachment {
            Some(image) if self.provider_type.supports_vision() => vec![
                builder()
                    .image(to_image_mime(image.media_type), image.data.clone())
                    .build(),
                text,
            ],
            _ => vec![text],
        }
    }

    /// System turns become the backend's system prompt instead of chat turns.
    fn system_prompt(messages: &[ChatMessage]) -> Option<String> {
        let parts: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    fn build_llm(
        &self,
        system: Option<String>,
        config: Option<&LLMConfig>,
    ) -> Result<Box<dyn llm::LLMProvider>, LLMError> {
        let mut builder = llm::builder::LLMBuilder::new()
            .backend(self.provider_type.to_llm_backend())
            .model(&self.model)
            .api_key(&self.api_key);

        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }

        if let Some(system) = system {
            builder = builder.system(system);
        }

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                builder = builder.temperature(temp);
            }
            if let Some(max_tok) = cfg.max_tokens {
                builder = builder.max_tokens(max_tok);
            }
            if let Some(top_p) = cfg.top_p {
                builder = builder.top_p(top_p);
            }
        }

        builder
            .build()
            .map_err(|e| LLMError::Config(format!("Failed to build LLM: {}", e)))
    }
}

fn to_image_mime(media_type: ImageMediaType) -> llm::chat::ImageMime {
    match media_type {
        ImageMediaType::Png => llm::chat::ImageMime::PNG,
        ImageMediaType::Jpeg => llm::chat::ImageMime::JPEG,
    }
}

#[async_trait]
impl LLMProvider for UnifiedLLMProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: Option<&LLMConfig>,
    ) -> Result<LLMResponse, LLMError> {
        let llm_messages: Vec<llm::chat::ChatMessage> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .flat_map(|m| self.convert_message(m))
            .collect();

        let llm = self.build_llm(Self::system_prompt(messages), config)?;

        let response = llm.chat(&llm_messages).await.map_err(|e| LLMError::API {
            message: format!("{} provider error: {}", self.provider_type.display_name(), e),
            status: None,
        })?;

        let content = response.text().ok_or_else(|| LLMError::API {
            message: "Provider returned no text content".to_string(),
            status: None,
        })?;

        let usage = response
            .usage()
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        let mut result = LLMResponse::new(content, FinishReason::Stop).with_model(self.model.clone());
        result.usage = usage;
        Ok(result)
    }

    fn provider_name(&self) -> &str {
        self.provider_type.as_str()
    }

    fn supports(&self, feature: LLMFeature) -> bool {
        match feature {
            LLMFeature::SystemMessages => true,
            LLMFeature::Vision => self.provider_type.supports_vision(),
            LLMFeature::JsonMode => matches!(self.provider_type, ProviderType::Zhipu),
        }
    }
}

pub struct ProviderBuilder {
    provider_type: Option<ProviderType>,
    model: Option<String>,
    api_key: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            provider_type: None,
            model: None,
            api_key: None,
            api_key_env: None,
            base_url: None,
        }
    }

    pub fn provider(mut self, provider_type: ProviderType) -> Self {
        self.provider_type = Some(provider_type);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_key_env(mut self, env_var: impl Into<String>) -> Self {
        self.api_key_env = Some(env_var.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<UnifiedLLMProvider, LLMError> {
        let provider_type = self
            .provider_type
            .ok_or_else(|| LLMError::Config("Provider type not set".to_string()))?;

        let model = self
            .model
            .unwrap_or_else(|| provider_type.default_model().to_string());

        let api_key = match (self.api_key, self.api_key_env) {
            (Some(key), _) => Some(key),
            (None, Some(env_var)) => Some(std::env::var(&env_var).map_err(|_| {
                LLMError::Config(format!("API key environment variable {} not found", env_var))
            })?),
            (None, None) => None,
        };

        UnifiedLLMProvider::new(provider_type, model, api_key, self.base_url)
    }
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let provider = ProviderBuilder::new()
            .provider(ProviderType::Anthropic)
            .model("claude-3-5-sonnet-20240620")
            .api_key("XXXXXXXXXX")
            .build()
            .unwrap();

        assert_eq!(provider.provider_name(), "anthropic");
        assert_eq!(provider.model_name(), "claude-3-5-sonnet-20240620");
        assert!(provider.base_url().is_none());
        assert!(provider.supports(LLMFeature::Vision));
    }

    #[test]
    fn test_builder_zhipu_defaults() {
        let provider = ProviderBuilder::new()
            .provider(ProviderType::Zhipu)
            .api_key("XXXXXXXXXX")
            .build()
            .unwrap();

        assert_eq!(provider.model_name(), "glm-4.7-flash");
        assert_eq!(provider.base_url(), Some(ZHIPU_BASE_URL));
        assert!(!provider.supports(LLMFeature::Vision));
    }

    #[test]
    fn test_builder_missing_fields() {
        let result = ProviderBuilder::new().model("glm-4.7-flash").build();

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Provider type not set")
        );
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = ProviderBuilder::new()
            .provider(ProviderType::Zhipu)
            .api_key("  ")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!("glm".parse::<ProviderType>().unwrap(), ProviderType::Zhipu);
        assert_eq!("Zhipu".parse::<ProviderType>().unwrap(), ProviderType::Zhipu);
        assert_eq!("claude".parse::<ProviderType>().unwrap(), ProviderType::Anthropic);
        assert_eq!(" anthropic ".parse::<ProviderType>().unwrap(), ProviderType::Anthropic);
        assert!("GLM-4.7 (Free/Fast)".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_provider_type_serde_aliases() {
        let parsed: ProviderType = serde_yaml::from_str("claude").unwrap();
        assert_eq!(parsed, ProviderType::Anthropic);
        let json = serde_json::to_string(&ProviderType::Zhipu).unwrap();
        assert_eq!(json, "\"zhipu\"");
    }

    #[test]
    fn test_system_prompt_folding() {
        let messages = vec![
            ChatMessage::system("facts"),
            ChatMessage::user("hi"),
            ChatMessage::system("more"),
        ];
        assert_eq!(
            UnifiedLLMProvider::system_prompt(&messages),
            Some("facts\n\nmore".to_string())
        );
        assert_eq!(UnifiedLLMProvider::system_prompt(&messages[1..2]), None);
    }

    fn anthropic() -> UnifiedLLMProvider {
        ProviderBuilder::new()
            .provider(ProviderType::Anthropic)
            .api_key("XXXXXXXXXX")
            .build()
            .unwrap()
    }

    #[test]
    fn test_image_message_keeps_its_text() {
        let provider = anthropic();
        let msg = ChatMessage::user("User Question: What is this?").with_attachment(
            maiko_core::ImageAttachment::new(ImageMediaType::Png, vec![1, 2, 3]),
        );

        let converted = provider.convert_message(&msg);

        assert_eq!(converted.len(), 2);
        assert_eq!(
            converted[0].message_type,
            llm::chat::MessageType::Image((llm::chat::ImageMime::PNG, vec![1, 2, 3]))
        );
        assert_eq!(converted[1].message_type, llm::chat::MessageType::Text);
        assert_eq!(converted[1].content, "User Question: What is this?");
        assert_eq!(converted[1].role, llm::chat::ChatRole::User);
    }

    #[test]
    fn test_text_only_engine_ignores_attachment() {
        let provider = ProviderBuilder::new()
            .provider(ProviderType::Zhipu)
            .api_key("XXXXXXXXXX")
            .build()
            .unwrap();
        let msg = ChatMessage::user("hi").with_attachment(maiko_core::ImageAttachment::new(
            ImageMediaType::Jpeg,
            vec![9],
        ));

        let converted = provider.convert_message(&msg);

        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].message_type, llm::chat::MessageType::Text);
        assert_eq!(converted[0].content, "hi");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", anthropic());
        assert!(!rendered.contains("XXXXXXXXXX"));
        assert!(rendered.contains("<redacted>"));
    }
}
