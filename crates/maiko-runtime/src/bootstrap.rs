//! Wiring a [`ChatSession`] from configuration

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use maiko_core::LLMProvider;
use maiko_llm::{LLMRegistry, ProviderBuilder, ProviderType, TimeoutProvider};
use maiko_memory::{
    ArchivalConfig, ArchivalEngine, LLMSummarizer, MemoryEngine, NoopSummarizer, Summarizer,
};
use maiko_storage::{ArchiveStore, FactStore, FileConversationStore};

use crate::config::{MaikoConfig, ProviderSettings};
use crate::session::ChatSession;

/// Register every configured provider that has an API key, each behind the
/// request timeout. Providers without a key are skipped with a warning.
pub fn build_registry(config: &MaikoConfig) -> LLMRegistry {
    let timeout = Duration::from_secs(config.llm.request_timeout_secs);
    let mut registry = LLMRegistry::new();

    for provider_type in ProviderType::ALL {
        let Some(settings) = config.llm.providers.get(&provider_type) else {
            continue;
        };

        match build_provider(provider_type, settings) {
            Ok(provider) => {
                debug!(provider = %provider_type, "Provider registered");
                registry.register(
                    provider_type.as_str(),
                    Arc::new(TimeoutProvider::new(provider, timeout)),
                );
            }
            Err(e) => {
                warn!(provider = %provider_type, error = %e, "Provider unavailable");
            }
        }
    }

    registry.set_default(config.llm.default.as_str());
    registry.set_router(config.llm.background.as_str());
    registry
}

fn build_provider(
    provider_type: ProviderType,
    settings: &ProviderSettings,
) -> Result<Arc<dyn LLMProvider>, maiko_core::LLMError> {
    let mut builder = ProviderBuilder::new().provider(provider_type);
    if let Some(ref model) = settings.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = settings.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ref key) = settings.api_key {
        builder = builder.api_key(key);
    } else if let Some(ref env) = settings.api_key_env {
        builder = builder.api_key_env(env);
    }
    Ok(Arc::new(builder.build()?))
}

/// Build a session over the file stores under `config.data_dir`.
pub fn build_session(config: &MaikoConfig) -> ChatSession {
    build_session_with_registry(config, build_registry(config))
}

pub fn build_session_with_registry(config: &MaikoConfig, registry: LLMRegistry) -> ChatSession {
    let conversations = Arc::new(FileConversationStore::new(config.chat_path()));
    let facts = Arc::new(FactStore::new(config.memory_path()).with_window(config.memory.context_window));
    let archive =
        Arc::new(ArchiveStore::new(config.archive_path()).with_capacity(config.archive.capacity));

    let background = registry.router().ok();
    if background.is_none() {
        warn!("No background model available, facts will not be learned");
    }

    let summarizer: Arc<dyn Summarizer> = match &background {
        Some(llm) => Arc::new(LLMSummarizer::new(llm.clone())),
        None => Arc::new(NoopSummarizer),
    };

    let archival = ArchivalEngine::new(conversations.clone(), archive, summarizer).with_config(
        ArchivalConfig {
            retention: config.max_chat_history,
            digest_chars: config.archive.digest_chars,
        },
    );

    let engines: Vec<&str> = ProviderType::ALL
        .iter()
        .filter(|p| registry.has(p.as_str()))
        .map(|p| p.as_str())
        .collect();
    info!(
        data_dir = %config.data_dir.display(),
        engines = ?engines,
        "Session ready"
    );

    let mut session = ChatSession::new(registry, conversations, facts.clone(), archival)
        .with_engine(config.llm.default)
        .with_trim_history_limit(config.trim_history_limit);

    if let Some(llm) = background {
        session = session.with_memory(MemoryEngine::new(llm, facts));
    }

    session
}
