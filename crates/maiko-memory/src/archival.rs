//! Retention of stored conversations
//!
//! Once more than `retention` conversations are stored, the oldest one is
//! summarized into the archive and deleted. One conversation per pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use maiko_core::{ChatMessage, ConversationStorage};
use maiko_storage::{ArchiveRecord, ArchiveStore};

use crate::summarizer::Summarizer;

pub const EMPTY_CONVERSATION_DIGEST: &str = "(empty conversation)";
pub const SUMMARY_FAILED: &str = "Summary failed.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivalConfig {
    #[serde(default = "default_retention")]
    pub retention: usize,
    #[serde(default = "default_digest_chars")]
    pub digest_chars: usize,
}

fn default_retention() -> usize {
    10
}

fn default_digest_chars() -> usize {
    200
}

impl Default for ArchivalConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
            digest_chars: default_digest_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub label: String,
    pub summary: String,
    pub summary_failed: bool,
    /// `false` when the transcript could not be removed after archiving.
    pub deleted: bool,
}

pub struct ArchivalEngine {
    conversations: Arc<dyn ConversationStorage>,
    archive: Arc<ArchiveStore>,
    summarizer: Arc<dyn Summarizer>,
    config: ArchivalConfig,
    lock: Mutex<()>,
}

impl ArchivalEngine {
    pub fn new(
        conversations: Arc<dyn ConversationStorage>,
        archive: Arc<ArchiveStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            conversations,
            archive,
            summarizer,
            config: ArchivalConfig::default(),
            lock: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: ArchivalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ArchivalConfig {
        &self.config
    }

    pub fn archive(&self) -> &Arc<ArchiveStore> {
        &self.archive
    }

    pub async fn maybe_archive(&self) -> Option<ArchiveOutcome> {
        self.run(None).await
    }

    /// Like [`maybe_archive`](Self::maybe_archive) but never picks `protected`.
    pub async fn maybe_archive_except(&self, protected: &str) -> Option<ArchiveOutcome> {
        self.run(Some(protected)).await
    }

    /// One archival pass over the oldest unprotected conversation.
    ///
    /// If the archive record cannot be written the conversation is not
    /// deleted, so its transcript is never lost; the store stays above
    /// retention and the next pass retries. A failed delete after a
    /// successful archive write is reported as `deleted: false`.
    async fn run(&self, protected: Option<&str>) -> Option<ArchiveOutcome> {
        let _guard = self.lock.lock().await;

        let ids = self.conversations.list().await;
        if ids.len() <= self.config.retention {
            return None;
        }

        let oldest = ids.into_iter().find(|id| Some(id.as_str()) != protected)?;
        debug!(id = %oldest, "Archiving oldest conversation");

        let messages = self.conversations.load(&oldest).await;
        let digest = digest(&messages, self.config.digest_chars);

        let (summary, summary_failed) = match self.summarizer.summarize(&oldest, &digest).await {
            Ok(summary) => (summary, false),
            Err(e) => {
                warn!(id = %oldest, error = %e, "Summary failed, archiving placeholder");
                (SUMMARY_FAILED.to_string(), true)
            }
        };

        if let Err(e) = self
            .archive
            .prepend(ArchiveRecord::new(oldest.clone(), summary.clone()))
            .await
        {
            error!(id = %oldest, error = %e, "Failed to write archive, keeping conversation");
            return None;
        }

        let deleted = match self.conversations.delete(&oldest).await {
            Ok(_) => true,
            Err(e) => {
                error!(id = %oldest, error = %e, "Failed to delete archived conversation");
                false
            }
        };

        info!(id = %oldest, summary_failed, "Conversation archived");
        Some(ArchiveOutcome {
            label: oldest,
            summary,
            summary_failed,
            deleted,
        })
    }
}

/// Opening and closing text of a conversation, each cut to `max_chars`.
pub fn digest(messages: &[ChatMessage], max_chars: usize) -> String {
    let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
        return EMPTY_CONVERSATION_DIGEST.to_string();
    };

    format!(
        "Start: {}\nEnd: {}",
        truncate_chars(&first.content, max_chars),
        truncate_chars(&last.content, max_chars)
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::LLMSummarizer;
    use maiko_llm::mock::MockLLMProvider;
    use maiko_storage::{FileConversationStore, InMemoryConversationStore};
    use tempfile::TempDir;

    fn conversation(n: usize) -> Vec<ChatMessage> {
        vec![
            ChatMessage::user(format!("question {}", n)),
            ChatMessage::assistant(format!("answer {}", n)),
        ]
    }

    async fn seed(store: &dyn ConversationStorage, count: usize) -> Vec<String> {
        let mut ids = Vec::new();
        for i in 1..=count {
            let id = format!("2024-01-{:02}_12-00-00", i);
            store.save(&id, &conversation(i)).await.unwrap();
            ids.push(id);
        }
        ids
    }

    fn engine(
        conversations: Arc<dyn ConversationStorage>,
        temp_dir: &TempDir,
        mock: &MockLLMProvider,
    ) -> ArchivalEngine {
        ArchivalEngine::new(
            conversations,
            Arc::new(ArchiveStore::new(temp_dir.path().join("chat_archive.json"))),
            Arc::new(LLMSummarizer::new(Arc::new(mock.clone()))),
        )
    }

    #[tokio::test]
    async fn test_no_op_at_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryConversationStore::new());
        seed(store.as_ref(), 10).await;
        let mock = MockLLMProvider::new("router");
        let engine = engine(store.clone(), &temp_dir, &mock);

        assert!(engine.maybe_archive().await.is_none());
        assert_eq!(store.count().await, 10);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_eleventh_conversation_archives_oldest() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileConversationStore::new(temp_dir.path().join("chats")));
        let ids = seed(store.as_ref(), 11).await;
        let mut mock = MockLLMProvider::new("router");
        mock.set_response("- asked question 1\n- got answer 1\n- done");
        let engine = engine(store.clone(), &temp_dir, &mock);

        let outcome = engine.maybe_archive().await.unwrap();

        assert_eq!(outcome.label, ids[0]);
        assert!(outcome.deleted);
        assert!(!outcome.summary_failed);
        assert_eq!(store.count().await, 10);
        assert!(!store.exists(&ids[0]).await);
        assert!(!temp_dir.path().join("chats").join(format!("{}.json", ids[0])).exists());

        let records = engine.archive().load().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, ids[0]);
        assert_eq!(records[0].summary, "- asked question 1\n- got answer 1\n- done");

        let prompt = mock.last_call().unwrap().prompt().to_string();
        assert!(prompt.contains("question 1"));
        assert!(prompt.contains("answer 1"));

        // Back at the threshold
        assert!(engine.maybe_archive().await.is_none());
    }

    #[tokio::test]
    async fn test_summary_failure_still_archives_and_deletes() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryConversationStore::new());
        let ids = seed(store.as_ref(), 11).await;
        let mut mock = MockLLMProvider::new("router");
        mock.set_error("timeout");
        let engine = engine(store.clone(), &temp_dir, &mock);

        let outcome = engine.maybe_archive().await.unwrap();

        assert!(outcome.summary_failed);
        assert_eq!(outcome.summary, SUMMARY_FAILED);
        assert!(!store.exists(&ids[0]).await);
        assert_eq!(engine.archive().load().await[0].summary, "Summary failed.");
    }

    #[tokio::test]
    async fn test_protected_conversation_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryConversationStore::new());
        let ids = seed(store.as_ref(), 11).await;
        let mock = MockLLMProvider::new("router");
        let engine = engine(store.clone(), &temp_dir, &mock);

        let outcome = engine.maybe_archive_except(&ids[0]).await.unwrap();

        assert_eq!(outcome.label, ids[1]);
        assert!(store.exists(&ids[0]).await);
        assert!(!store.exists(&ids[1]).await);
    }

    #[tokio::test]
    async fn test_one_conversation_per_pass() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryConversationStore::new());
        seed(store.as_ref(), 13).await;
        let mock = MockLLMProvider::new("router");
        let engine = engine(store.clone(), &temp_dir, &mock);

        engine.maybe_archive().await.unwrap();
        assert_eq!(store.count().await, 12);

        engine.maybe_archive().await.unwrap();
        let labels: Vec<String> = engine
            .archive()
            .load()
            .await
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, vec!["2024-01-02_12-00-00", "2024-01-01_12-00-00"]);
    }

    #[tokio::test]
    async fn test_archive_write_failure_keeps_conversation() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the archive file should be makes the rename fail
        let archive_path = temp_dir.path().join("chat_archive.json");
        std::fs::create_dir_all(archive_path.join("blocker")).unwrap();

        let store = Arc::new(InMemoryConversationStore::new());
        let ids = seed(store.as_ref(), 11).await;
        let mock = MockLLMProvider::new("router");
        let engine = ArchivalEngine::new(
            store.clone(),
            Arc::new(ArchiveStore::new(&archive_path)),
            Arc::new(LLMSummarizer::new(Arc::new(mock))),
        );

        assert!(engine.maybe_archive().await.is_none());
        assert!(store.exists(&ids[0]).await);
        assert_eq!(store.count().await, 11);
    }

    #[tokio::test]
    async fn test_custom_retention() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryConversationStore::new());
        seed(store.as_ref(), 3).await;
        let mock = MockLLMProvider::new("router");
        let engine = engine(store.clone(), &temp_dir, &mock).with_config(ArchivalConfig {
            retention: 2,
            digest_chars: 200,
        });

        assert!(engine.maybe_archive().await.is_some());
        assert_eq!(store.count().await, 2);
    }

    #[test]
    fn test_digest() {
        assert_eq!(digest(&[], 200), "(empty conversation)");

        let messages = vec![
            ChatMessage::user("héllo wörld"),
            ChatMessage::assistant("middle"),
            ChatMessage::assistant("goodbye"),
        ];
        assert_eq!(digest(&messages, 200), "Start: héllo wörld\nEnd: goodbye");
        assert_eq!(digest(&messages, 3), "Start: hél\nEnd: goo");
    }

    #[test]
    fn test_digest_single_message() {
        let long = "x".repeat(500);
        let digest = digest(&[ChatMessage::user(long)], 200);
        assert_eq!(digest.matches('x').count(), 400);
    }
}
