//! The persisted settings schema

use crate::error::ValidationError;
use crate::validation::Validator;
use bookshelf_core::ConnectionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// UI color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// A named reference to a library root
///
/// `absolute_path` is a directory for local and embedded libraries and the
/// base url of the content server for remote ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPath {
    pub id: String,
    pub display_name: String,
    pub absolute_path: String,
    #[serde(default)]
    pub connection: ConnectionKind,
}

impl LibraryPath {
    /// Creates a library path with a fresh id
    pub fn new(
        display_name: impl Into<String>,
        absolute_path: impl Into<String>,
        connection: ConnectionKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            absolute_path: absolute_path.into(),
            connection,
        }
    }
}

/// User preferences and known libraries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub start_fullscreen: bool,
    pub active_library_id: Option<String>,
    pub library_paths: Vec<LibraryPath>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            start_fullscreen: false,
            active_library_id: None,
            library_paths: Vec::new(),
        }
    }
}

impl Settings {
    /// The library `active_library_id` points at, if it is known
    pub fn active_library(&self) -> Option<&LibraryPath> {
        let id = self.active_library_id.as_deref()?;
        self.library_paths.iter().find(|path| path.id == id)
    }

    /// Validates the whole record, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_ids = Vec::new();

        for (index, path) in self.library_paths.iter().enumerate() {
            let field = |name: &str| format!("libraryPaths[{}].{}", index, name);

            if let Err(e) = Validator::not_empty(&path.id, &field("id")) {
                errors.push(e);
            }
            if let Err(e) = Validator::unique(&path.id, &mut seen_ids, &field("id")) {
                errors.push(e);
            }
            if let Err(e) = Validator::not_empty(&path.display_name, &field("displayName")) {
                errors.push(e);
            }
            if let Err(e) = Validator::not_empty(&path.absolute_path, &field("absolutePath")) {
                errors.push(e);
            }
        }

        if let Some(id) = &self.active_library_id {
            if self.active_library().is_none() {
                errors.push(ValidationError::with_value(
                    "activeLibraryId",
                    "does not match a known library",
                    id,
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(!settings.start_fullscreen);
        assert!(settings.active_library_id.is_none());
        assert!(settings.library_paths.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut settings = Settings::default();
        settings
            .library_paths
            .push(LibraryPath::new("Books", "/home/me/Books", ConnectionKind::Embedded));

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["startFullscreen"], false);
        assert!(json["activeLibraryId"].is_null());
        assert_eq!(json["libraryPaths"][0]["displayName"], "Books");
        assert_eq!(json["libraryPaths"][0]["connection"], "embedded");
    }

    #[test]
    fn test_library_path_without_connection_defaults_to_local() {
        let path: LibraryPath = serde_json::from_str(
            r#"{"id":"1","displayName":"Calibre","absolutePath":"/books"}"#,
        )
        .unwrap();
        assert_eq!(path.connection, ConnectionKind::Local);
    }

    #[test]
    fn test_validate_reports_dangling_active_id_and_duplicates() {
        let path = LibraryPath::new("Books", "/books", ConnectionKind::Local);
        let settings = Settings {
            active_library_id: Some("missing".to_string()),
            library_paths: vec![path.clone(), path],
            ..Settings::default()
        };

        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "activeLibraryId"));
        assert!(errors.iter().any(|e| e.field == "libraryPaths[1].id"));
    }

    #[test]
    fn test_theme_parsing() {
        assert_eq!("Light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!("system".parse::<Theme>(), Ok(Theme::System));
        assert!("sepia".parse::<Theme>().is_err());
    }
}
