//! Per-turn fact list maintenance

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use maiko_core::LLMProvider;
use maiko_storage::FactStore;

use crate::mode::MemoryMode;
use crate::parse::parse_fact_list;
use crate::prompts::MemoryPrompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// New facts were appended.
    Merged { added: usize },
    /// The list was replaced by the model's keep-list.
    Replaced,
    /// The model answered but nothing changed.
    Unchanged,
    ProviderFailed,
    /// The reply held no JSON list.
    ParseFailed,
    WriteFailed,
}

/// What a single [`MemoryEngine::update`] call did. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub mode: MemoryMode,
    pub outcome: UpdateOutcome,
    pub facts_before: usize,
    pub facts_after: usize,
}

impl UpdateReport {
    pub fn changed(&self) -> bool {
        matches!(
            self.outcome,
            UpdateOutcome::Merged { .. } | UpdateOutcome::Replaced
        )
    }
}

/// Keeps the fact list current after every chat turn.
///
/// Prompts only ever show the model the visible window of the store. Merges
/// append to and dedupe against the full persisted list. A forget-mode answer
/// replaces the full list, so facts older than the window do not survive a
/// forget turn.
pub struct MemoryEngine {
    llm: Arc<dyn LLMProvider>,
    store: Arc<FactStore>,
    prompts: MemoryPrompts,
    lock: Mutex<()>,
}

impl MemoryEngine {
    pub fn new(llm: Arc<dyn LLMProvider>, store: Arc<FactStore>) -> Self {
        Self {
            llm,
            store,
            prompts: MemoryPrompts::default(),
            lock: Mutex::new(()),
        }
    }

    pub fn with_prompts(mut self, prompts: MemoryPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn store(&self) -> &Arc<FactStore> {
        &self.store
    }

    /// The facts prompts are built from.
    pub async fn facts(&self) -> Vec<String> {
        self.store.load().await
    }

    /// Classify the turn, ask the model and apply its answer.
    ///
    /// Never fails. Provider, parse and write errors leave the stored list as
    /// it was and are reported through [`UpdateOutcome`].
    pub async fn update(&self, user_input: &str, ai_response: &str) -> UpdateReport {
        let _guard = self.lock.lock().await;

        let mode = MemoryMode::classify(user_input, ai_response);
        let all = self.store.load_all().await;
        let visible = &all[all.len().saturating_sub(self.store.window())..];
        let before = all.len();
        debug!(mode = %mode, facts = before, "Updating memory");

        let report = |outcome, after| UpdateReport {
            mode,
            outcome,
            facts_before: before,
            facts_after: after,
        };

        let prompt = self.prompts.render(mode, visible, user_input, ai_response);
        let reply = match self.llm.complete_text(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(mode = %mode, error = %e, "Fact extraction failed, keeping facts");
                return report(UpdateOutcome::ProviderFailed, before);
            }
        };

        let Some(extracted) = parse_fact_list(&reply) else {
            warn!(mode = %mode, "Model reply held no fact list, keeping facts");
            return report(UpdateOutcome::ParseFailed, before);
        };

        let (updated, outcome) = if mode.replaces() {
            (extracted, UpdateOutcome::Replaced)
        } else {
            let mut merged = all.clone();
            for fact in extracted {
                if !merged.contains(&fact) {
                    merged.push(fact);
                }
            }
            let added = merged.len() - before;
            (merged, UpdateOutcome::Merged { added })
        };

        if updated == all {
            debug!(mode = %mode, "Facts unchanged, skipping write");
            return report(UpdateOutcome::Unchanged, before);
        }

        if let Err(e) = self.store.save(&updated).await {
            error!(path = %self.store.path().display(), error = %e, "Failed to save facts");
            return report(UpdateOutcome::WriteFailed, before);
        }

        info!(mode = %mode, before, after = updated.len(), "Facts updated");
        report(outcome, updated.len())
    }
}
