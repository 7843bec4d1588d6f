//! Browser-local-storage style backend
//!
//! Every key is its own entry holding a JSON-encoded string, the way a web
//! build keeps settings in `localStorage`. Entries live as files in one
//! directory.

use crate::backend::{BackendKind, SettingsBackend};
use crate::error::{ConfigError, ConfigResult};
use crate::persistence::write_atomic;
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-key string entries in a storage directory
pub struct WebStorageBackend {
    dir: PathBuf,
}

impl WebStorageBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl SettingsBackend for WebStorageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Web
    }

    async fn get(&self, key: &str) -> ConfigResult<Option<Value>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        // An unparsable entry reads like a missing one so it gets reseeded
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring unreadable storage entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> ConfigResult<()> {
        let encoded = serde_json::to_string(&value)?;
        write_atomic(&self.entry_path(key), &encoded)?;
        log::debug!("Stored '{}' in {}", key, self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_entries_are_json_strings_per_key() {
        let temp_dir = TempDir::new().unwrap();
        let backend = WebStorageBackend::new(temp_dir.path());

        backend.set("theme", json!("system")).await.unwrap();
        backend
            .set("libraryPaths", json!([{ "id": "1", "displayName": "A", "absolutePath": "/a" }]))
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("theme.json")).unwrap(),
            "\"system\""
        );
        assert_eq!(backend.get("theme").await.unwrap(), Some(json!("system")));
        assert_eq!(backend.get("startFullscreen").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_garbage_entry_reads_as_missing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("theme.json"), "not json").unwrap();
        let backend = WebStorageBackend::new(temp_dir.path());

        assert_eq!(backend.get("theme").await.unwrap(), None);
    }
}
