//! LLM providers for the MAiKO chat stack

pub mod mock;
pub mod providers;
pub mod registry;
pub mod timeout;

pub use maiko_core::{
    ChatMessage, FinishReason, LLMConfig, LLMError, LLMFeature, LLMProvider, LLMResponse, Role,
    TokenUsage,
};
pub use providers::{ProviderBuilder, ProviderType, UnifiedLLMProvider};
pub use registry::LLMRegistry;
pub use timeout::TimeoutProvider;
