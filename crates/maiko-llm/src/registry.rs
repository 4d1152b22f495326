use std::collections::HashMap;
use std::sync::Arc;

use maiko_core::{LLMError, LLMProvider};

use crate::providers::ProviderType;

/// Named providers plus two roles: `default` answers chat turns and
/// `router` runs background work (fact extraction, archive summaries).
#[derive(Clone)]
pub struct LLMRegistry {
    providers: HashMap<String, Arc<dyn LLMProvider>>,
    default_alias: String,
    router_alias: Option<String>,
}

impl std::fmt::Debug for LLMRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("default_alias", &self.default_alias)
            .field("router_alias", &self.router_alias)
            .finish()
    }
}

impl LLMRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_alias: "default".to_string(),
            router_alias: None,
        }
    }

    pub fn register(&mut self, alias: impl Into<String>, provider: Arc<dyn LLMProvider>) {
        self.providers.insert(alias.into(), provider);
    }

    pub fn set_default(&mut self, alias: impl Into<String>) {
        self.default_alias = alias.into();
    }

    pub fn set_router(&mut self, alias: impl Into<String>) {
        self.router_alias = Some(alias.into());
    }

    pub fn get(&self, alias: &str) -> Result<Arc<dyn LLMProvider>, LLMError> {
        self.providers
            .get(alias)
            .cloned()
            .ok_or_else(|| LLMError::Config(format!("LLM alias not found: {}", alias)))
    }

    /// Providers built from configuration are registered under their type name.
    pub fn get_type(&self, provider_type: ProviderType) -> Result<Arc<dyn LLMProvider>, LLMError> {
        self.get(provider_type.as_str())
    }

    pub fn default(&self) -> Result<Arc<dyn LLMProvider>, LLMError> {
        self.get(&self.default_alias)
    }

    pub fn router(&self) -> Result<Arc<dyn LLMProvider>, LLMError> {
        match &self.router_alias {
            Some(alias) => self.get(alias).or_else(|_| self.default()),
            None => self.default(),
        }
    }

    pub fn has(&self, alias: &str) -> bool {
        self.providers.contains_key(alias)
    }

    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.providers.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for LLMRegistry {
    fn default() -> Self {
        Self::new()
    }
}
