//! File system persistence for settings
//!
//! Every write goes to a temporary file in the target directory which is
//! then renamed over the destination, so a settings file is never left
//! half-written.

use crate::backend::{BackendKind, SettingsBackend};
use crate::error::{ConfigError, ConfigResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// Name of the document written by [`StoreBackend`]
pub const SETTINGS_FILE: &str = "settings.json";

/// Ensures a directory exists, creating it if necessary
pub(crate) fn ensure_directory_exists(path: &Path) -> ConfigResult<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| ConfigError::DirectoryCreationError {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Created settings directory: {}", path.display());
    }
    Ok(())
}

/// Writes `content` to `path` through a temporary file and an atomic rename
pub(crate) fn write_atomic(path: &Path, content: &str) -> ConfigResult<()> {
    let dir = path.parent().ok_or_else(|| ConfigError::PathResolutionError {
        reason: format!("{} has no parent directory", path.display()),
    })?;
    ensure_directory_exists(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir).map_err(ConfigError::IoError)?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(ConfigError::IoError)?;
    temp_file.flush().map_err(ConfigError::IoError)?;

    temp_file.persist(path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

/// Native persistent store: one JSON document holding every key
pub struct StoreBackend {
    path: PathBuf,
    document: Mutex<Option<Map<String, Value>>>,
}

impl StoreBackend {
    /// Store backed by `settings.json` inside `dir`
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            document: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ConfigResult<Map<String, Value>> {
        if !self.path.exists() {
            log::info!(
                "Settings file not found at {}, starting empty",
                self.path.display()
            );
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;

        match value {
            Value::Object(map) => Ok(map),
            other => {
                log::warn!(
                    "Settings file {} holds {} instead of an object, ignoring it",
                    self.path.display(),
                    json_type(&other)
                );
                Ok(Map::new())
            }
        }
    }
}

#[async_trait]
impl SettingsBackend for StoreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Store
    }

    async fn get(&self, key: &str) -> ConfigResult<Option<Value>> {
        let mut document = self.document.lock().await;
        if document.is_none() {
            *document = Some(self.load()?);
        }
        Ok(document.as_ref().and_then(|map| map.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> ConfigResult<()> {
        let mut document = self.document.lock().await;
        let mut updated = match document.take() {
            Some(map) => map,
            None => self.load()?,
        };
        let previous = updated.insert(key.to_string(), value);

        let serialized = serde_json::to_string_pretty(&updated)?;
        match write_atomic(&self.path, &serialized) {
            Ok(()) => {
                log::debug!("Saved '{}' to {}", key, self.path.display());
                *document = Some(updated);
                Ok(())
            }
            Err(e) => {
                // Keep the in-memory document in line with the file
                match previous {
                    Some(previous) => updated.insert(key.to_string(), previous),
                    None => updated.remove(key),
                };
                *document = Some(updated);
                Err(e)
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = StoreBackend::in_directory(temp_dir.path());

        assert_eq!(backend.get("theme").await.unwrap(), None);
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn test_set_persists_whole_document() {
        let temp_dir = TempDir::new().unwrap();
        let backend = StoreBackend::in_directory(temp_dir.path());

        backend.set("theme", json!("light")).await.unwrap();
        backend.set("activeLibraryId", Value::Null).await.unwrap();

        let contents = fs::read_to_string(backend.path()).unwrap();
        let document: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(document, json!({ "theme": "light", "activeLibraryId": null }));

        // A fresh backend over the same file sees the values
        let reopened = StoreBackend::in_directory(temp_dir.path());
        assert_eq!(reopened.get("theme").await.unwrap(), Some(json!("light")));
        assert_eq!(reopened.get("activeLibraryId").await.unwrap(), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        let backend = StoreBackend::in_directory(temp_dir.path());

        let result = backend.get("theme").await;
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let backend = StoreBackend::in_directory(&nested);

        backend.set("startFullscreen", json!(true)).await.unwrap();
        assert!(nested.join(SETTINGS_FILE).exists());
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.json");

        write_atomic(&path, "{}").unwrap();
        write_atomic(&path, "{\"a\":1}").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }
}
