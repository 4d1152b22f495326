//! Summaries of archived conversations

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::json_file::JsonFile;
use crate::Result;

pub const DEFAULT_ARCHIVE_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Identifier of the conversation the summary was made from.
    #[serde(rename = "date")]
    pub label: String,
    pub summary: String,
}

impl ArchiveRecord {
    pub fn new(label: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            summary: summary.into(),
        }
    }
}

/// Newest-first list of archive records, capped at `capacity`.
pub struct ArchiveStore {
    file: JsonFile<Vec<ArchiveRecord>>,
    capacity: usize,
}

impl ArchiveStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: JsonFile::new(path),
            capacity: DEFAULT_ARCHIVE_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn load(&self) -> Vec<ArchiveRecord> {
        self.file.load().await
    }

    pub async fn save(&self, records: &[ArchiveRecord]) -> Result<()> {
        self.file.save(&records.to_vec()).await
    }

    /// Insert `record` at the head, drop the oldest entries beyond capacity
    /// and persist. Returns the stored list.
    pub async fn prepend(&self, record: ArchiveRecord) -> Result<Vec<ArchiveRecord>> {
        let mut records = self.load().await;
        records.insert(0, record);
        records.truncate(self.capacity);
        self.save(&records).await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prepend_keeps_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(temp_dir.path().join("chat_archive.json"));

        store.prepend(ArchiveRecord::new("2024-01-01_09-00-00", "first")).await.unwrap();
        store.prepend(ArchiveRecord::new("2024-01-02_09-00-00", "second")).await.unwrap();

        let records = store.load().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].summary, "second");
        assert_eq!(records[1].summary, "first");
    }

    #[tokio::test]
    async fn test_fifty_first_record_truncates_oldest() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(temp_dir.path().join("chat_archive.json"));

        for i in 1..=50 {
            store
                .prepend(ArchiveRecord::new(format!("conv-{:02}", i), format!("summary {}", i)))
                .await
                .unwrap();
        }
        assert_eq!(store.load().await.len(), 50);

        let records = store
            .prepend(ArchiveRecord::new("conv-51", "summary 51"))
            .await
            .unwrap();

        assert_eq!(records.len(), 50);
        assert_eq!(records[0].label, "conv-51");
        assert_eq!(records[49].label, "conv-02");
        assert!(!records.iter().any(|r| r.label == "conv-01"));
        assert_eq!(store.load().await, records);
    }

    #[tokio::test]
    async fn test_on_disk_field_names() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chat_archive.json");
        let store = ArchiveStore::new(&path);
        store.prepend(ArchiveRecord::new("2024-03-01_10-00-00", "- a\n- b\n- c")).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"date": "2024-03-01_10-00-00", "summary": "- a\n- b\n- c"}])
        );
    }

    #[tokio::test]
    async fn test_custom_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(temp_dir.path().join("a.json")).with_capacity(2);

        for label in ["a", "b", "c"] {
            store.prepend(ArchiveRecord::new(label, "s")).await.unwrap();
        }

        let labels: Vec<String> = store.load().await.into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["c", "b"]);
    }
}
