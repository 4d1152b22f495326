//! Storage trait for conversation transcripts

use async_trait::async_trait;

use crate::error::Result;
use crate::message::ChatMessage;

/// One transcript per conversation id.
///
/// Reads never fail: a missing or unreadable conversation loads as empty and
/// an unreadable store lists as empty. Writes report their errors.
///
/// Built-in backends: `FileConversationStore` and `InMemoryConversationStore`.
#[async_trait]
pub trait ConversationStorage: Send + Sync {
    /// Overwrite the full transcript of `id`.
    async fn save(&self, id: &str, messages: &[ChatMessage]) -> Result<()>;
    /// Load a transcript, or an empty one if it does not exist.
    async fn load(&self, id: &str) -> Vec<ChatMessage>;
    /// Remove a conversation. Returns `false` if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;
    /// All ids, oldest first.
    async fn list(&self) -> Vec<String>;
    async fn exists(&self, id: &str) -> bool;

    async fn count(&self) -> usize {
        self.list().await.len()
    }
}
