//! Bookshelf Settings System
//!
//! A fixed-schema settings record (`theme`, `startFullscreen`,
//! `activeLibraryId`, `libraryPaths`) kept in an in-memory cache and written
//! through to one of two interchangeable backends:
//!
//! - **Store**: a single JSON document on disk, written atomically
//! - **Web**: one JSON-encoded entry per key, like browser local storage
//!
//! The backend is chosen by [`BackendKind::detect`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bookshelf_config::{SettingsManager, Theme, ThemeKey};
//!
//! # async fn run() -> bookshelf_config::ConfigResult<()> {
//! let manager = SettingsManager::detect()?;
//! manager.initialize().await?;
//!
//! manager.set::<ThemeKey>(Theme::Light).await?;
//! assert_eq!(manager.get::<ThemeKey>()?, Theme::Light);
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod keys;
mod manager;
mod persistence;
mod settings;
mod validation;
mod web_storage;

pub use backend::{BackendKind, SettingsBackend, BACKEND_ENV_VAR};
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use keys::{
    ActiveLibraryIdKey, LibraryPathsKey, SettingKey, StartFullscreenKey, ThemeKey, SETTING_KEYS,
};
pub use manager::SettingsManager;
pub use persistence::{StoreBackend, SETTINGS_FILE};
pub use settings::{LibraryPath, Settings, Theme};
pub use validation::Validator;
pub use web_storage::WebStorageBackend;
