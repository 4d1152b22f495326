//! Application configuration

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use maiko_core::{MaikoError, Result};
use maiko_llm::ProviderType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaikoConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_chat_dir")]
    pub chat_dir: String,

    #[serde(default = "default_memory_file")]
    pub memory_file: String,

    #[serde(default = "default_archive_file")]
    pub archive_file: String,

    /// Stored conversations kept before the oldest is archived.
    #[serde(default = "default_max_chat_history")]
    pub max_chat_history: usize,

    /// Messages of the open conversation sent with each request.
    #[serde(default = "default_trim_history_limit")]
    pub trim_history_limit: usize,

    #[serde(default)]
    pub memory: MemorySettings,

    #[serde(default)]
    pub archive: ArchiveSettings,

    #[serde(default)]
    pub llm: LLMSettings,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_chat_dir() -> String {
    "chats".to_string()
}

fn default_memory_file() -> String {
    "memory_bank.json".to_string()
}

fn default_archive_file() -> String {
    "chat_archive.json".to_string()
}

fn default_max_chat_history() -> usize {
    10
}

fn default_trim_history_limit() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MaikoConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chat_dir: default_chat_dir(),
            memory_file: default_memory_file(),
            archive_file: default_archive_file(),
            max_chat_history: default_max_chat_history(),
            trim_history_limit: default_trim_history_limit(),
            memory: MemorySettings::default(),
            archive: ArchiveSettings::default(),
            llm: LLMSettings::default(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Facts shown to the model per request.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_context_window() -> usize {
    maiko_storage::DEFAULT_FACT_WINDOW
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_digest_chars")]
    pub digest_chars: usize,
}

fn default_capacity() -> usize {
    maiko_storage::DEFAULT_ARCHIVE_CAPACITY
}

fn default_digest_chars() -> usize {
    200
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            digest_chars: default_digest_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMSettings {
    /// Engine new chats start with.
    #[serde(default = "default_provider")]
    pub default: ProviderType,

    /// Model used for fact extraction and archive summaries.
    #[serde(default = "default_provider")]
    pub background: ProviderType,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_providers")]
    pub providers: HashMap<ProviderType, ProviderSettings>,
}

fn default_provider() -> ProviderType {
    ProviderType::Zhipu
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_providers() -> HashMap<ProviderType, ProviderSettings> {
    ProviderType::ALL
        .into_iter()
        .map(|provider| (provider, ProviderSettings::for_provider(provider)))
        .collect()
}

impl Default for LLMSettings {
    fn default() -> Self {
        Self {
            default: default_provider(),
            background: default_provider(),
            request_timeout_secs: default_request_timeout_secs(),
            providers: default_providers(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Inline key. Prefer `api_key_env` or the provider's standard variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ProviderSettings {
    pub fn for_provider(provider: ProviderType) -> Self {
        Self {
            model: Some(provider.default_model().to_string()),
            base_url: provider.default_base_url().map(String::from),
            api_key: None,
            api_key_env: None,
        }
    }
}

impl MaikoConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// File (or defaults), then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MAX_CHAT_HISTORY") {
            self.max_chat_history = parse_number("MAX_CHAT_HISTORY", &value)?;
        }
        if let Some(value) = lookup("TRIM_HISTORY_LIMIT") {
            self.trim_history_limit = parse_number("TRIM_HISTORY_LIMIT", &value)?;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.log_level = value.trim().to_lowercase();
        }
        if let Some(value) = lookup("ZHIPUAI_BASE_URL") {
            self.llm
                .providers
                .entry(ProviderType::Zhipu)
                .or_insert_with(|| ProviderSettings::for_provider(ProviderType::Zhipu))
                .base_url = Some(value);
        }
        if let Some(value) = lookup("MAIKO_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
        debug!(data_dir = %self.data_dir.display(), "Configuration overrides applied");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_chat_history", self.max_chat_history),
            ("trim_history_limit", self.trim_history_limit),
            ("memory.context_window", self.memory.context_window),
            ("archive.capacity", self.archive.capacity),
            ("archive.digest_chars", self.archive.digest_chars),
            ("llm.request_timeout_secs", self.llm.request_timeout_secs as usize),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(MaikoError::Config(format!("{} must be greater than 0", name)));
            }
        }

        for (role, provider) in [("default", self.llm.default), ("background", self.llm.background)] {
            if !self.llm.providers.contains_key(&provider) {
                return Err(MaikoError::Config(format!(
                    "llm.{} refers to provider '{}' which is not configured",
                    role, provider
                )));
            }
        }

        Ok(())
    }

    pub fn chat_path(&self) -> PathBuf {
        self.data_dir.join(&self.chat_dir)
    }

    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join(&self.memory_file)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join(&self.archive_file)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MaikoError::Config(format!("{} must be a number, got '{}'", name, value)))
}
