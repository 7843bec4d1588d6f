//! Typed keys into the settings record
//!
//! Each key names one top-level field of [`Settings`] together with its value
//! type and storage name. The trait is sealed; the schema is fixed.

use crate::settings::{LibraryPath, Settings, Theme};
use serde::de::DeserializeOwned;
use serde::Serialize;

mod sealed {
    pub trait Sealed {}
}

/// A field of the settings schema
pub trait SettingKey: sealed::Sealed + Send + Sync + 'static {
    /// Name under which the value is persisted
    const NAME: &'static str;

    type Value: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    fn read(settings: &Settings) -> Self::Value;

    fn write(settings: &mut Settings, value: Self::Value);

    fn default_value() -> Self::Value {
        Self::read(&Settings::default())
    }
}

macro_rules! setting_key {
    ($key:ident, $name:literal, $value:ty, $field:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $key;

        impl sealed::Sealed for $key {}

        impl SettingKey for $key {
            const NAME: &'static str = $name;
            type Value = $value;

            fn read(settings: &Settings) -> Self::Value {
                settings.$field.clone()
            }

            fn write(settings: &mut Settings, value: Self::Value) {
                settings.$field = value;
            }
        }
    };
}

setting_key!(ThemeKey, "theme", Theme, theme);
setting_key!(StartFullscreenKey, "startFullscreen", bool, start_fullscreen);
setting_key!(ActiveLibraryIdKey, "activeLibraryId", Option<String>, active_library_id);
setting_key!(LibraryPathsKey, "libraryPaths", Vec<LibraryPath>, library_paths);

/// Storage names of every key, in hydration order
pub const SETTING_KEYS: [&str; 4] = [
    ThemeKey::NAME,
    StartFullscreenKey::NAME,
    ActiveLibraryIdKey::NAME,
    LibraryPathsKey::NAME,
];
