//! Settings storage backends and capability detection

use crate::error::{ConfigError, ConfigResult};
use crate::persistence::StoreBackend;
use crate::web_storage::WebStorageBackend;
use async_trait::async_trait;
use directories::ProjectDirs;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable that forces a backend choice (`store` or `web`)
pub const BACKEND_ENV_VAR: &str = "BOOKSHELF_SETTINGS_BACKEND";

/// Key/value persistence for settings entries
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Stored value for `key`, or `None` if the key was never written
    async fn get(&self, key: &str) -> ConfigResult<Option<Value>>;

    /// Durably stores `value` under `key` before returning
    async fn set(&self, key: &str, value: Value) -> ConfigResult<()>;
}

/// Which backend implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Native persistent store (one JSON document)
    Store,
    /// Browser-local-storage equivalent (one entry per key)
    Web,
}

impl BackendKind {
    /// Picks a backend from the environment override, then host capabilities
    ///
    /// A platform configuration directory means a native store is available.
    pub fn detect() -> Self {
        if let Ok(forced) = std::env::var(BACKEND_ENV_VAR) {
            match forced.parse() {
                Ok(kind) => return kind,
                Err(e) => log::warn!("Ignoring {}: {}", BACKEND_ENV_VAR, e),
            }
        }

        if project_dirs().is_some() {
            BackendKind::Store
        } else {
            BackendKind::Web
        }
    }

    /// Default directory for this backend's data
    pub fn default_dir(self) -> ConfigResult<PathBuf> {
        match (self, project_dirs()) {
            (BackendKind::Store, Some(dirs)) => Ok(dirs.config_dir().to_path_buf()),
            (BackendKind::Web, Some(dirs)) => Ok(dirs.data_local_dir().join("local-storage")),
            (BackendKind::Store, None) => Err(ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            }),
            (BackendKind::Web, None) => Ok(std::env::current_dir()?.join(".bookshelf")),
        }
    }

    /// Opens this backend in `dir`, or in its default directory
    pub fn open(self, dir: Option<PathBuf>) -> ConfigResult<Arc<dyn SettingsBackend>> {
        let dir = match dir {
            Some(dir) => dir,
            None => self.default_dir()?,
        };
        log::info!("Using {} settings backend in {}", self, dir.display());

        Ok(match self {
            BackendKind::Store => Arc::new(StoreBackend::in_directory(dir)),
            BackendKind::Web => Arc::new(WebStorageBackend::new(dir)),
        })
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Store => f.write_str("store"),
            BackendKind::Web => f.write_str("web"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "store" => Ok(BackendKind::Store),
            "web" => Ok(BackendKind::Web),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "bookshelf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_backend_kind() {
        assert_eq!("store".parse::<BackendKind>().unwrap(), BackendKind::Store);
        assert_eq!(" WEB ".parse::<BackendKind>().unwrap(), BackendKind::Web);
        assert!(matches!(
            "cloud".parse::<BackendKind>(),
            Err(ConfigError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_open_in_directory() {
        let temp_dir = TempDir::new().unwrap();

        let store = BackendKind::Store
            .open(Some(temp_dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(store.kind(), BackendKind::Store);

        let web = BackendKind::Web
            .open(Some(temp_dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(web.kind(), BackendKind::Web);
    }
}
