//! Transient records used while importing files into a library

use crate::types::{FileType, Identifier};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file on disk that the backend accepted as importable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportableFile {
    pub path: PathBuf,
    pub file_type: FileType,
    pub mime_type: String,
}

impl ImportableFile {
    pub fn new(path: PathBuf, file_type: FileType) -> Self {
        Self {
            path,
            mime_type: file_type.mime_type().to_string(),
            file_type,
        }
    }
}

/// Best-guess metadata for an importable file, before it is committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportableBookMetadata {
    pub file: ImportableFile,
    pub title: String,
    #[serde(default)]
    pub author_list: Vec<String>,
    #[serde(default)]
    pub identifier_list: Vec<Identifier>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub has_cover: bool,
}

impl ImportableBookMetadata {
    /// Metadata carrying only a title, everything else unknown
    pub fn untitled(file: ImportableFile, title: impl Into<String>) -> Self {
        Self {
            file,
            title: title.into(),
            author_list: Vec::new(),
            identifier_list: Vec::new(),
            publisher: None,
            language: None,
            tag_list: Vec::new(),
            publication_date: None,
            has_cover: false,
        }
    }
}

/// Destination for a device transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceTarget {
    /// A mounted e-reader or removable drive
    ExternalDrive { path: PathBuf },
}
