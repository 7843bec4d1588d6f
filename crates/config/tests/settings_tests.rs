//! Integration tests for the settings system

use bookshelf_config::{
    ActiveLibraryIdKey, BackendKind, LibraryPath, LibraryPathsKey, SettingsBackend,
    SettingsManager, StartFullscreenKey, StoreBackend, Theme, ThemeKey, WebStorageBackend,
    SETTINGS_FILE, SETTING_KEYS,
};
use bookshelf_core::ConnectionKind;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn setup(kind: BackendKind) -> Result<(TempDir, SettingsManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = SettingsManager::open(kind, Some(temp_dir.path().to_path_buf()))?;
    Ok((temp_dir, manager))
}

#[tokio::test]
async fn test_initialize_seeds_every_key() -> Result<(), Box<dyn std::error::Error>> {
    for kind in [BackendKind::Store, BackendKind::Web] {
        let (temp_dir, manager) = setup(kind)?;
        manager.initialize().await?;

        let backend = kind.open(Some(temp_dir.path().to_path_buf()))?;
        for key in SETTING_KEYS {
            assert!(backend.get(key).await?.is_some(), "{} not seeded in {}", key, kind);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_initialize_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    for kind in [BackendKind::Store, BackendKind::Web] {
        let (temp_dir, manager) = setup(kind)?;
        manager.initialize().await?;
        manager.set::<ThemeKey>(Theme::Light).await?;

        // Same manager again
        manager.initialize().await?;
        assert_eq!(manager.get::<ThemeKey>()?, Theme::Light);

        // A fresh manager over the same backend state
        let reopened = SettingsManager::open(kind, Some(temp_dir.path().to_path_buf()))?;
        reopened.initialize().await?;
        assert_eq!(reopened.get::<ThemeKey>()?, Theme::Light);
        assert!(!reopened.get::<StartFullscreenKey>()?);
    }
    Ok(())
}

#[tokio::test]
async fn test_set_then_get_returns_value() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup(BackendKind::Web)?;
    manager.initialize().await?;

    let path = LibraryPath::new("Fiction", "/srv/fiction", ConnectionKind::Embedded);
    manager.set::<LibraryPathsKey>(vec![path.clone()]).await?;
    manager.set::<ActiveLibraryIdKey>(Some(path.id.clone())).await?;

    assert_eq!(manager.get::<LibraryPathsKey>()?, vec![path.clone()]);
    assert_eq!(manager.active_library()?, Some(path));
    Ok(())
}

#[tokio::test]
async fn test_invalid_stored_value_is_reseeded() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let backend = Arc::new(StoreBackend::in_directory(temp_dir.path()));
    backend.set("theme", json!("neon")).await?;
    backend.set("startFullscreen", json!(true)).await?;

    let manager = SettingsManager::new(backend.clone());
    manager.initialize().await?;

    assert_eq!(manager.get::<ThemeKey>()?, Theme::Dark);
    assert!(manager.get::<StartFullscreenKey>()?);
    assert_eq!(backend.get("theme").await?, Some(json!("dark")));
    Ok(())
}

#[tokio::test]
async fn test_failed_write_leaves_cache_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = SettingsManager::new(Arc::new(StoreBackend::in_directory(temp_dir.path())));
    manager.initialize().await?;

    // Replace the settings file with a directory so the rename fails
    let file = temp_dir.path().join(SETTINGS_FILE);
    std::fs::remove_file(&file)?;
    std::fs::create_dir(&file)?;
    std::fs::write(file.join("occupied"), "x")?;

    assert!(manager.set::<ThemeKey>(Theme::Light).await.is_err());
    assert_eq!(manager.get::<ThemeKey>()?, Theme::Dark);
    Ok(())
}

#[tokio::test]
async fn test_overlapping_writes_to_one_key_all_land() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup(BackendKind::Store)?;
    let manager = Arc::new(manager);
    manager.initialize().await?;

    let mut handles = Vec::new();
    for index in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .add_library_path(LibraryPath::new(
                    format!("Library {}", index),
                    format!("/libraries/{}", index),
                    ConnectionKind::Local,
                ))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(manager.library_paths()?.len(), 8);
    Ok(())
}

#[tokio::test]
async fn test_web_backend_stores_strings() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = SettingsManager::new(Arc::new(WebStorageBackend::new(temp_dir.path())));
    manager.initialize().await?;
    manager.set::<ThemeKey>(Theme::System).await?;

    let raw = std::fs::read_to_string(temp_dir.path().join("theme.json"))?;
    assert_eq!(raw, "\"system\"");
    Ok(())
}
