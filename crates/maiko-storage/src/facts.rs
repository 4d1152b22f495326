//! Persistent fact list about the user

use std::path::Path;

use crate::json_file::JsonFile;
use crate::Result;

pub const DEFAULT_FACT_WINDOW: usize = 20;

/// Ordered facts in a single JSON array file.
///
/// The file may hold any number of facts; [`FactStore::load`] only surfaces
/// the most recent `window` of them. The cap is applied when reading, never
/// when writing.
pub struct FactStore {
    file: JsonFile<Vec<String>>,
    window: usize,
}

impl FactStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: JsonFile::new(path),
            window: DEFAULT_FACT_WINDOW,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The last `window` facts, oldest first. This is the view prompts get.
    pub async fn load(&self) -> Vec<String> {
        let mut facts = self.file.load().await;
        let start = facts.len().saturating_sub(self.window);
        facts.drain(..start);
        facts
    }

    /// Every persisted fact.
    pub async fn load_all(&self) -> Vec<String> {
        self.file.load().await
    }

    pub async fn save(&self, facts: &[String]) -> Result<()> {
        self.file.save(&facts.to_vec()).await
    }
}
