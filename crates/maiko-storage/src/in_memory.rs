use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use maiko_core::{ChatMessage, ConversationStorage, Result};

use crate::conversation::validate_id;

/// Process-local conversation store. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<BTreeMap<String, Vec<ChatMessage>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStorage for InMemoryConversationStore {
    async fn save(&self, id: &str, messages: &[ChatMessage]) -> Result<()> {
        validate_id(id)?;
        let stored = messages
            .iter()
            .map(|m| ChatMessage::new(m.role, m.content.clone()))
            .collect();
        self.conversations.write().insert(id.to_string(), stored);
        Ok(())
    }

    async fn load(&self, id: &str) -> Vec<ChatMessage> {
        self.conversations.read().get(id).cloned().unwrap_or_default()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.conversations.write().remove(id).is_some())
    }

    async fn list(&self) -> Vec<String> {
        self.conversations.read().keys().cloned().collect()
    }

    async fn exists(&self, id: &str) -> bool {
        self.conversations.read().contains_key(id)
    }
}
