//! E-book file formats recognised by the library

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported e-book file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Epub,
    Pdf,
    Mobi,
    Azw3,
    Fb2,
    Cbz,
    Txt,
}

impl FileType {
    /// Every format, in the order they are offered in file pickers
    pub const ALL: [FileType; 7] = [
        Self::Epub,
        Self::Pdf,
        Self::Mobi,
        Self::Azw3,
        Self::Fb2,
        Self::Cbz,
        Self::Txt,
    ];

    /// Detects format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            "mobi" | "prc" => Some(Self::Mobi),
            "azw3" | "azw" => Some(Self::Azw3),
            "fb2" => Some(Self::Fb2),
            "cbz" => Some(Self::Cbz),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detects format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the canonical file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Pdf => "pdf",
            Self::Mobi => "mobi",
            Self::Azw3 => "azw3",
            Self::Fb2 => "fb2",
            Self::Cbz => "cbz",
            Self::Txt => "txt",
        }
    }

    /// Returns the MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Epub => "application/epub+zip",
            Self::Pdf => "application/pdf",
            Self::Mobi => "application/x-mobipocket-ebook",
            Self::Azw3 => "application/vnd.amazon.ebook",
            Self::Fb2 => "application/x-fictionbook+xml",
            Self::Cbz => "application/vnd.comicbook+zip",
            Self::Txt => "text/plain",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
