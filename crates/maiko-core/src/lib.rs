//! Core types and traits for the MAiKO chat stack

pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::{MaikoError, Result};
pub use message::{ChatMessage, ImageAttachment, ImageMediaType, Role};
pub use traits::llm::{LLMError, LLMProvider};
pub use traits::storage::ConversationStorage;
pub use types::{FinishReason, LLMConfig, LLMFeature, LLMResponse, TokenUsage};
