//! Chat session: one open conversation plus the memory around it

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, info, warn};

use maiko_core::{ChatMessage, ConversationStorage, ImageAttachment, MaikoError, Result, Role};
use maiko_llm::{LLMRegistry, ProviderType};
use maiko_memory::{ArchivalEngine, ArchiveOutcome, MemoryEngine, UpdateReport};
use maiko_storage::{ArchiveRecord, FactStore, unique_conversation_id};

/// Prompt used when an image is sent without any text.
pub const DEFAULT_IMAGE_PROMPT: &str = "What is this?";

pub const EMPTY_PREVIEW: &str = "Empty chat";

/// Result of one [`ChatSession::send`].
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub conversation_id: String,
    pub reply: String,
    /// The reply is an error notice rather than a model answer.
    pub provider_failed: bool,
    pub memory: Option<UpdateReport>,
    pub archived: Option<ArchiveOutcome>,
}

pub struct ChatSession {
    registry: LLMRegistry,
    conversations: Arc<dyn ConversationStorage>,
    facts: Arc<FactStore>,
    memory: Option<MemoryEngine>,
    archival: ArchivalEngine,
    engine: ProviderType,
    messages: Vec<ChatMessage>,
    conversation_id: Option<String>,
    trim_history_limit: usize,
}

impl ChatSession {
    pub fn new(
        registry: LLMRegistry,
        conversations: Arc<dyn ConversationStorage>,
        facts: Arc<FactStore>,
        archival: ArchivalEngine,
    ) -> Self {
        Self {
            registry,
            conversations,
            facts,
            memory: None,
            archival,
            engine: ProviderType::Zhipu,
            messages: Vec::new(),
            conversation_id: None,
            trim_history_limit: 20,
        }
    }

    pub fn with_memory(mut self, memory: MemoryEngine) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_engine(mut self, engine: ProviderType) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_trim_history_limit(mut self, limit: usize) -> Self {
        self.trim_history_limit = limit.max(1);
        self
    }

    pub fn engine(&self) -> ProviderType {
        self.engine
    }

    pub fn select_engine(&mut self, engine: ProviderType) {
        debug!(engine = %engine, "Engine selected");
        self.engine = engine;
    }

    /// Engines with a configured provider.
    pub fn available_engines(&self) -> Vec<ProviderType> {
        ProviderType::ALL
            .into_iter()
            .filter(|p| self.registry.has(p.as_str()))
            .collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Send one user turn and record the reply.
    ///
    /// Provider problems do not fail the call; they become the reply text.
    /// Only a rejected attachment or a failed transcript save is an error.
    pub async fn send(&mut self, prompt: &str, image: Option<ImageAttachment>) -> Result<ChatTurn> {
        if image.is_some() && !self.engine.supports_vision() {
            return Err(MaikoError::UnsupportedAttachment(format!(
                "{} is text-only, switch to {} to send images",
                self.engine.display_name(),
                ProviderType::Anthropic.display_name()
            )));
        }

        let prompt = if image.is_some() && prompt.trim().is_empty() {
            DEFAULT_IMAGE_PROMPT.to_string()
        } else {
            prompt.to_string()
        };

        self.messages.push(ChatMessage::user(prompt.clone()));

        let facts = self.facts.load().await;
        let request = self.build_request(&prompt, &facts, image);
        let (reply, provider_failed) = self.complete(&request).await;
        self.messages.push(ChatMessage::assistant(reply.clone()));

        let memory = match &self.memory {
            Some(engine) => Some(engine.update(&prompt, &reply).await),
            None => None,
        };

        let archived = match &self.conversation_id {
            Some(id) => self.archival.maybe_archive_except(id).await,
            None => self.archival.maybe_archive().await,
        };

        let id = match &self.conversation_id {
            Some(id) => id.clone(),
            None => {
                let id = unique_conversation_id(self.conversations.as_ref(), Local::now()).await;
                self.conversation_id = Some(id.clone());
                id
            }
        };

        if let Err(e) = self.conversations.save(&id, &self.messages).await {
            error!(id = %id, error = %e, "Failed to save conversation");
            return Err(e);
        }
        info!(id = %id, engine = %self.engine, messages = self.messages.len(), "Turn recorded");

        Ok(ChatTurn {
            conversation_id: id,
            reply,
            provider_failed,
            memory,
            archived,
        })
    }

    fn build_request(
        &self,
        prompt: &str,
        facts: &[String],
        image: Option<ImageAttachment>,
    ) -> Vec<ChatMessage> {
        let start = self.messages.len().saturating_sub(self.trim_history_limit);
        let mut request = self.messages[start..].to_vec();

        match image {
            Some(image) => {
                let facts_json = serde_json::to_string(facts).unwrap_or_else(|_| "[]".to_string());
                let content = format!(
                    "Context about user: {}. \n\nUser Question: {}",
                    facts_json, prompt
                );
                if let Some(last) = request.last_mut() {
                    *last = ChatMessage::user(content).with_attachment(image);
                }
            }
            None => {
                let system = format!(
                    "Here is what you know about user: {}\n\nConversation:",
                    facts.join(". ")
                );
                request.insert(0, ChatMessage::system(system));
            }
        }

        request
    }

    async fn complete(&self, request: &[ChatMessage]) -> (String, bool) {
        let name = self.engine.display_name();
        let provider = match self.registry.get_type(self.engine) {
            Ok(provider) => provider,
            Err(_) => {
                warn!(engine = %self.engine, "No provider configured");
                return (format!("No {} key found.", name), true);
            }
        };

        match provider.complete(request, None).await {
            Ok(response) => (response.content, false),
            Err(e) => {
                warn!(engine = %self.engine, error = %e, "Chat request failed");
                (format!("{} Error: {}", name, e), true)
            }
        }
    }

    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
    }

    pub async fn open(&mut self, id: &str) -> Result<()> {
        if !self.conversations.exists(id).await {
            return Err(MaikoError::NotFound(format!("conversation {}", id)));
        }
        self.messages = self.conversations.load(id).await;
        self.conversation_id = Some(id.to_string());
        debug!(id, messages = self.messages.len(), "Conversation opened");
        Ok(())
    }

    /// Delete the open conversation and start a new one.
    pub async fn delete_current(&mut self) -> Result<bool> {
        let deleted = match self.conversation_id.take() {
            Some(id) => {
                let deleted = self.conversations.delete(&id).await?;
                info!(id = %id, deleted, "Conversation deleted");
                deleted
            }
            None => false,
        };
        self.messages.clear();
        Ok(deleted)
    }

    /// Stored conversation ids, newest first.
    pub async fn list_conversations(&self) -> Vec<String> {
        let mut ids = self.conversations.list().await;
        ids.reverse();
        ids
    }

    /// First user message of a conversation (or its first message), cut to
    /// `len` characters.
    pub async fn preview(&self, id: &str, len: usize) -> String {
        let messages = self.conversations.load(id).await;
        messages
            .iter()
            .find(|m| m.role == Role::User)
            .or_else(|| messages.first())
            .map(|m| m.content.chars().take(len).collect::<String>())
            .unwrap_or_else(|| EMPTY_PREVIEW.to_string())
    }

    /// The facts prompts are built from.
    pub async fn facts(&self) -> Vec<String> {
        self.facts.load().await
    }

    pub async fn archive_records(&self) -> Vec<ArchiveRecord> {
        self.archival.archive().load().await
    }
}
