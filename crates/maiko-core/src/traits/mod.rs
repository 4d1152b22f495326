//! Core traits for MAiKO

pub mod llm;
pub mod storage;

pub use llm::LLMProvider;
pub use storage::ConversationStorage;
