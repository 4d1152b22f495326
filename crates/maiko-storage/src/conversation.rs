use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use maiko_core::{ChatMessage, ConversationStorage, MaikoError, Result};

use crate::json_file::write_atomic;

const ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamp-derived conversation identifier, `YYYY-MM-DD_HH-MM-SS`.
///
/// Lexicographic order of these ids is chronological order.
pub fn conversation_id(now: DateTime<Local>) -> String {
    now.format(ID_FORMAT).to_string()
}

pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.is_empty()
        || id.starts_with('.')
        || id.contains(['/', '\\'])
        || id.contains("..")
    {
        return Err(MaikoError::Storage(format!("Invalid conversation id: {:?}", id)));
    }
    Ok(())
}

/// One `<id>.json` file per conversation under `base_path`.
pub struct FileConversationStore {
    base_path: PathBuf,
}

impl FileConversationStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn conversation_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    pub async fn create_id(&self, now: DateTime<Local>) -> String {
        unique_conversation_id(self, now).await
    }
}

/// Fresh id for a conversation started at `now`.
///
/// When `store` already holds a conversation from the same second a
/// zero-padded `-NNN` suffix is appended, starting at `-002`, so ids keep
/// sorting in creation order.
pub async fn unique_conversation_id(store: &dyn ConversationStorage, now: DateTime<Local>) -> String {
    let base = conversation_id(now);
    if !store.exists(&base).await {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}-{:03}", base, n);
        if !store.exists(&candidate).await {
            return candidate;
        }
        n += 1;
    }
}

#[async_trait]
impl ConversationStorage for FileConversationStore {
    async fn save(&self, id: &str, messages: &[ChatMessage]) -> Result<()> {
        validate_id(id)?;
        let json = serde_json::to_vec_pretty(messages)?;
        write_atomic(&self.conversation_path(id), &json).await?;
        debug!(id, messages = messages.len(), "Conversation saved");
        Ok(())
    }

    async fn load(&self, id: &str) -> Vec<ChatMessage> {
        if validate_id(id).is_err() {
            return Vec::new();
        }

        let path = self.conversation_path(id);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(id, error = %e, "Failed to read conversation");
                return Vec::new();
            }
        };

        serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(id, error = %e, "Corrupt conversation file");
            Vec::new()
        })
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        match tokio::fs::remove_file(self.conversation_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Vec<String> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.base_path.display(), error = %e, "Failed to list conversations");
                return Vec::new();
            }
        };

        let mut ids = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().map(|e| e == "json").unwrap_or(false) {
                        if let Some(stem) = path.file_stem() {
                            let stem = stem.to_string_lossy();
                            if !stem.starts_with('.') {
                                ids.push(stem.to_string());
                            }
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read conversation directory entry");
                    break;
                }
            }
        }

        ids.sort();
        ids
    }

    async fn exists(&self, id: &str) -> bool {
        if validate_id(id).is_err() {
            return false;
        }
        tokio::fs::try_exists(self.conversation_path(id))
            .await
            .unwrap_or(false)
    }
}
