//! Single-value JSON files with atomic replacement

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use crate::{MaikoError, Result};

/// A file holding exactly one JSON value of type `T`.
///
/// `load` never fails: a missing file yields `T::default()` silently, an
/// unreadable or corrupt one yields it with a warning. `save` replaces the
/// whole file through a sibling temp file and a rename, so readers see either
/// the old or the new value and never a truncated one.
pub struct JsonFile<T> {
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> T {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read JSON file");
                return T::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt JSON file, using default");
                T::default()
            }
        }
    }

    pub async fn save(&self, value: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(value)?;
        write_atomic(&self.path, &json).await
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn remove(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| MaikoError::Storage(format!("Not a file path: {}", path.display())))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let tmp_path = dir.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Uuid::new_v4().simple()
    ));

    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let temp_dir = TempDir::new().unwrap();
        let file: JsonFile<Vec<String>> = JsonFile::new(temp_dir.path().join("absent.json"));

        assert!(file.load().await.is_empty());
        assert!(!file.exists().await);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file: JsonFile<Vec<String>> = JsonFile::new(temp_dir.path().join("facts.json"));

        file.save(&vec!["a".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(file.load().await, vec!["a", "b"]);

        file.save(&vec!["c".to_string()]).await.unwrap();
        assert_eq!(file.load().await, vec!["c"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("facts.json");
        tokio::fs::write(&path, "[\"unterminated").await.unwrap();

        let file: JsonFile<Vec<String>> = JsonFile::new(&path);
        assert!(file.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_loads_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("facts.json");
        tokio::fs::write(&path, r#"{"facts": ["x"]}"#).await.unwrap();

        let file: JsonFile<Vec<String>> = JsonFile::new(&path);
        assert!(file.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_parent_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("archive.json");
        let file: JsonFile<Vec<String>> = JsonFile::new(&path);

        file.save(&vec!["x".to_string()]).await.unwrap();

        let mut entries = tokio::fs::read_dir(path.parent().unwrap()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["archive.json"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let file: JsonFile<Vec<String>> = JsonFile::new(temp_dir.path().join("x.json"));

        assert!(!file.remove().await.unwrap());
        file.save(&Vec::new()).await.unwrap();
        assert!(file.remove().await.unwrap());
        assert!(!file.exists().await);
    }
}
