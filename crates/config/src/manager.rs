//! Settings manager - main API for settings operations

use crate::backend::{BackendKind, SettingsBackend};
use crate::keys::{
    ActiveLibraryIdKey, LibraryPathsKey, SettingKey, StartFullscreenKey, ThemeKey,
};
use crate::settings::{LibraryPath, Settings};
use crate::validation::Validator;
use crate::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use tokio::sync::Mutex;

/// Fixed-schema settings with a write-through in-memory cache
///
/// After [`initialize`](Self::initialize) every field of the cache is
/// populated. [`set`](Self::set) writes to the backend first and updates the
/// cache only once the backend accepted the value.
///
/// Writes to the same key are serialized, so overlapping `set` calls on one
/// key land in the order they acquire it. Different keys never wait on each
/// other. Helpers that touch both `libraryPaths` and `activeLibraryId` lock
/// them in that order.
pub struct SettingsManager {
    backend: Arc<dyn SettingsBackend>,
    cache: RwLock<Option<Settings>>,
    key_locks: StdMutex<HashMap<&'static str, Arc<Mutex<()>>>>,
    init_lock: Mutex<()>,
}

impl SettingsManager {
    /// Creates a manager over an explicit backend
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(None),
            key_locks: StdMutex::new(HashMap::new()),
            init_lock: Mutex::new(()),
        }
    }

    /// Creates a manager over the detected backend in its default directory
    pub fn detect() -> ConfigResult<Self> {
        Self::open(BackendKind::detect(), None)
    }

    /// Creates a manager over `kind`, stored in `dir` or the default location
    pub fn open(kind: BackendKind, dir: Option<PathBuf>) -> ConfigResult<Self> {
        Ok(Self::new(kind.open(dir)?))
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn is_initialized(&self) -> bool {
        self.read_cache().is_some()
    }

    /// Hydrates the cache from the backend, seeding missing keys with defaults
    ///
    /// Values already stored are adopted as they are, so calling this again
    /// never resets a user-set value. A stored value that no longer
    /// deserializes is replaced by the default.
    pub async fn initialize(&self) -> ConfigResult<Settings> {
        let _init = self.init_lock.lock().await;

        let mut settings = Settings::default();
        self.hydrate::<ThemeKey>(&mut settings).await?;
        self.hydrate::<StartFullscreenKey>(&mut settings).await?;
        self.hydrate::<ActiveLibraryIdKey>(&mut settings).await?;
        self.hydrate::<LibraryPathsKey>(&mut settings).await?;

        if let Err(errors) = settings.validate() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            log::warn!("Settings validation warnings: {}", message);
        }

        *self.write_cache() = Some(settings.clone());
        log::info!("Settings initialized ({} backend)", self.backend.kind());
        Ok(settings)
    }

    async fn hydrate<K: SettingKey>(&self, settings: &mut Settings) -> ConfigResult<()> {
        match self.backend.get(K::NAME).await? {
            Some(raw) => match serde_json::from_value::<K::Value>(raw) {
                Ok(value) => {
                    K::write(settings, value);
                    return Ok(());
                }
                Err(e) => log::warn!("Stored '{}' is invalid ({}), resetting to default", K::NAME, e),
            },
            None => log::debug!("Seeding '{}' with its default", K::NAME),
        }

        let default = K::default_value();
        self.backend
            .set(K::NAME, serde_json::to_value(&default)?)
            .await?;
        K::write(settings, default);
        Ok(())
    }

    /// Current value of `K` from the cache
    pub fn get<K: SettingKey>(&self) -> ConfigResult<K::Value> {
        self.read_cache()
            .as_ref()
            .map(K::read)
            .ok_or(ConfigError::NotInitialized)
    }

    /// Snapshot of the whole settings record
    pub fn settings(&self) -> ConfigResult<Settings> {
        self.read_cache().clone().ok_or(ConfigError::NotInitialized)
    }

    /// Writes `value` through to the backend, then into the cache
    pub async fn set<K: SettingKey>(&self, value: K::Value) -> ConfigResult<()> {
        let lock = self.key_lock(K::NAME);
        let _guard = lock.lock().await;
        self.write_locked::<K>(value).await
    }

    /// Read-modify-write of one key while holding its lock
    pub async fn update<K, F, R>(&self, update_fn: F) -> ConfigResult<R>
    where
        K: SettingKey,
        F: FnOnce(&mut K::Value) -> ConfigResult<R>,
    {
        let lock = self.key_lock(K::NAME);
        let _guard = lock.lock().await;

        let mut value = self.get::<K>()?;
        let result = update_fn(&mut value)?;
        self.write_locked::<K>(value).await?;
        Ok(result)
    }

    async fn write_locked<K: SettingKey>(&self, value: K::Value) -> ConfigResult<()> {
        if !self.is_initialized() {
            return Err(ConfigError::NotInitialized);
        }

        self.backend
            .set(K::NAME, serde_json::to_value(&value)?)
            .await?;

        if let Some(settings) = self.write_cache().as_mut() {
            K::write(settings, value);
        }
        log::debug!("Setting '{}' updated", K::NAME);
        Ok(())
    }

    /// Known libraries, in the order they were added
    pub fn library_paths(&self) -> ConfigResult<Vec<LibraryPath>> {
        self.get::<LibraryPathsKey>()
    }

    /// The library currently marked active, if it is still known
    pub fn active_library(&self) -> ConfigResult<Option<LibraryPath>> {
        Ok(self.settings()?.active_library().cloned())
    }

    /// Remembers a library, returning the stored entry
    ///
    /// A library with the same location and connection is not added twice;
    /// the existing entry is returned instead.
    pub async fn add_library_path(&self, path: LibraryPath) -> ConfigResult<LibraryPath> {
        for check in [
            Validator::not_empty(&path.display_name, "displayName"),
            Validator::not_empty(&path.absolute_path, "absolutePath"),
        ] {
            check.map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        let lock = self.key_lock(LibraryPathsKey::NAME);
        let _guard = lock.lock().await;

        let mut paths = self.get::<LibraryPathsKey>()?;
        if let Some(existing) = paths.iter().find(|known| {
            known.absolute_path == path.absolute_path && known.connection == path.connection
        }) {
            return Ok(existing.clone());
        }

        paths.push(path.clone());
        self.write_locked::<LibraryPathsKey>(paths).await?;
        log::info!("Added library '{}' at {}", path.display_name, path.absolute_path);
        Ok(path)
    }

    /// Forgets a library; returns false if the id was unknown
    ///
    /// Clears the active library when it pointed at the removed entry.
    pub async fn remove_library_path(&self, id: &str) -> ConfigResult<bool> {
        let paths_lock = self.key_lock(LibraryPathsKey::NAME);
        let _paths_guard = paths_lock.lock().await;
        let active_lock = self.key_lock(ActiveLibraryIdKey::NAME);
        let _active_guard = active_lock.lock().await;

        let mut paths = self.get::<LibraryPathsKey>()?;
        let before = paths.len();
        paths.retain(|path| path.id != id);
        if paths.len() == before {
            return Ok(false);
        }

        self.write_locked::<LibraryPathsKey>(paths).await?;
        if self.get::<ActiveLibraryIdKey>()?.as_deref() == Some(id) {
            self.write_locked::<ActiveLibraryIdKey>(None).await?;
        }
        Ok(true)
    }

    /// Marks a known library as active
    pub async fn set_active_library(&self, id: &str) -> ConfigResult<LibraryPath> {
        let paths_lock = self.key_lock(LibraryPathsKey::NAME);
        let _paths_guard = paths_lock.lock().await;
        let active_lock = self.key_lock(ActiveLibraryIdKey::NAME);
        let _active_guard = active_lock.lock().await;

        let path = self
            .get::<LibraryPathsKey>()?
            .into_iter()
            .find(|path| path.id == id)
            .ok_or_else(|| ConfigError::UnknownLibrary { id: id.to_string() })?;

        self.write_locked::<ActiveLibraryIdKey>(Some(path.id.clone()))
            .await?;
        Ok(path)
    }

    fn key_lock(&self, name: &'static str) -> Arc<Mutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(name).or_default())
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, Option<Settings>> {
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, Option<Settings>> {
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
