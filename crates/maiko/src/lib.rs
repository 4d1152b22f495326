//! MAiKO: a chat front-end with persistent user memory and conversation archival

pub mod config {
    pub use maiko_runtime::{
        ArchiveSettings, LLMSettings, MaikoConfig, MemorySettings, ProviderSettings,
    };
}

pub mod error {
    pub use maiko_core::{MaikoError, Result};
}

pub mod llm {
    pub use maiko_core::{
        ChatMessage, FinishReason, ImageAttachment, ImageMediaType, LLMConfig, LLMError,
        LLMFeature, LLMProvider, LLMResponse, Role, TokenUsage,
    };
    pub use maiko_llm::mock::{MockCall, MockLLMProvider};
    pub use maiko_llm::{
        LLMRegistry, ProviderBuilder, ProviderType, TimeoutProvider, UnifiedLLMProvider,
    };
}

pub mod memory {
    pub use maiko_memory::{
        ArchivalConfig, ArchivalEngine, ArchiveOutcome, LLMSummarizer, MemoryEngine, MemoryMode,
        MemoryPrompts, NoopSummarizer, Summarizer, UpdateOutcome, UpdateReport, digest,
        extract_json_block, parse_fact_list,
    };
}

pub mod session {
    pub use maiko_runtime::{
        ChatSession, ChatTurn, DEFAULT_IMAGE_PROMPT, EMPTY_PREVIEW, build_registry,
        build_session, build_session_with_registry,
    };
}

pub mod storage {
    pub use maiko_core::ConversationStorage;
    pub use maiko_storage::{
        ArchiveRecord, ArchiveStore, FactStore, FileConversationStore, InMemoryConversationStore,
        JsonFile, conversation_id, unique_conversation_id,
    };
}

pub use config::MaikoConfig;
pub use error::{MaikoError, Result};
pub use llm::{ChatMessage, ProviderType, Role};
pub use session::{ChatSession, ChatTurn};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_facade_end_to_end() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = MaikoConfig::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let mut chat = llm::MockLLMProvider::new("zhipu");
        chat.set_response("Nice to meet you, Sam.");
        let mut router = llm::MockLLMProvider::new("background");
        router.set_response("```json\n[\"Name is Sam\"]\n```");

        let mut registry = llm::LLMRegistry::new();
        registry.register("zhipu", Arc::new(chat));
        registry.register("background", Arc::new(router));
        registry.set_default("zhipu");
        registry.set_router("background");

        let mut session = session::build_session_with_registry(&config, registry);
        let turn = session.send("my name is Sam", None).await.unwrap();

        assert_eq!(turn.reply, "Nice to meet you, Sam.");
        assert_eq!(session.facts().await, vec!["Name is Sam"]);

        let facts = storage::FactStore::new(config.memory_path());
        assert_eq!(facts.load_all().await, vec!["Name is Sam"]);
    }
}
