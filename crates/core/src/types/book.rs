//! Book domain models

use crate::types::common::collect_errors;
use crate::types::{Author, AuthorId, Validator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque, stable identifier for a book
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a new random BookId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an identifier handed out by a backend
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the BookId as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file attached to a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BookFile {
    Local { path: PathBuf, mime_type: String },
    Remote { url: String, mime_type: String },
}

impl BookFile {
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Local { mime_type, .. } | Self::Remote { mime_type, .. } => mime_type,
        }
    }

    /// Path or url of the file, as handed to readers and openers
    pub fn location(&self) -> String {
        match self {
            Self::Local { path, .. } => path.to_string_lossy().into_owned(),
            Self::Remote { url, .. } => url.clone(),
        }
    }
}

/// Where a cover image lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverKind {
    Local,
    Remote,
}

/// Cover image reference for a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub kind: CoverKind,
    pub url: String,
    #[serde(default)]
    pub local_path: Option<PathBuf>,
}

impl CoverImage {
    /// Prefers the local copy of the cover when one is known
    pub fn location(&self) -> String {
        match &self.local_path {
            Some(path) => path.to_string_lossy().into_owned(),
            None => self.url.clone(),
        }
    }
}

/// External identifier attached to a book (ISBN, ASIN, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub label: String,
    pub value: String,
}

impl Identifier {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A book as held in a library snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub sortable_title: Option<String>,
    #[serde(default)]
    pub author_list: Vec<Author>,
    #[serde(default)]
    pub file_list: Vec<BookFile>,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub identifier_list: Vec<Identifier>,
}

impl Book {
    /// Creates a book with only the required fields set
    pub fn new(id: BookId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            sortable_title: None,
            author_list: Vec::new(),
            file_list: Vec::new(),
            cover_image: None,
            identifier_list: Vec::new(),
        }
    }

    /// The key books are ordered by when sorting on title
    pub fn sort_title(&self) -> &str {
        self.sortable_title.as_deref().unwrap_or(&self.title)
    }

    /// The first attached file, if any
    pub fn primary_file(&self) -> Option<&BookFile> {
        self.file_list.first()
    }

    pub fn identifier(&self, label: &str) -> Option<&str> {
        self.identifier_list
            .iter()
            .find(|identifier| identifier.label == label)
            .map(|identifier| identifier.value.as_str())
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        let mut labels = HashSet::new();
        for identifier in &self.identifier_list {
            if !labels.insert(identifier.label.as_str()) {
                errors.push(format!("Duplicate identifier label '{}'", identifier.label));
            }
        }

        collect_errors(errors)
    }
}

/// Partial update for a book; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable_title: Option<String>,
    /// Replaces the ordered author links of the book
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id_list: Option<Vec<AuthorId>>,
}

impl BookUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.sortable_title.is_none() && self.author_id_list.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_file(path: &str) -> BookFile {
        BookFile::Local {
            path: PathBuf::from(path),
            mime_type: "application/epub+zip".to_string(),
        }
    }

    #[test]
    fn test_book_id_creation() {
        let id1 = BookId::new();
        let id2 = BookId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_book_id_serializes_transparently() {
        let id = BookId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn test_sort_title_falls_back_to_title() {
        let mut book = Book::new(BookId::from("1"), "The Hobbit");
        assert_eq!(book.sort_title(), "The Hobbit");

        book.sortable_title = Some("Hobbit, The".to_string());
        assert_eq!(book.sort_title(), "Hobbit, The");
    }

    #[test]
    fn test_primary_file() {
        let mut book = Book::new(BookId::from("1"), "Emma");
        assert!(book.primary_file().is_none());

        book.file_list.push(local_file("/lib/emma.epub"));
        book.file_list.push(local_file("/lib/emma.pdf"));
        assert_eq!(book.primary_file().map(|f| f.location()), Some("/lib/emma.epub".to_string()));
    }

    #[test]
    fn test_cover_prefers_local_path() {
        let cover = CoverImage {
            kind: CoverKind::Remote,
            url: "https://example.org/cover.jpg".to_string(),
            local_path: Some(PathBuf::from("/cache/cover.jpg")),
        };
        assert_eq!(cover.location(), "/cache/cover.jpg");
    }

    #[test]
    fn test_book_file_tagging() {
        let json = serde_json::to_value(local_file("/a.epub")).unwrap();
        assert_eq!(json["kind"], "local");

        let remote: BookFile = serde_json::from_str(
            r#"{"kind":"remote","url":"https://host/b.pdf","mime_type":"application/pdf"}"#,
        )
        .unwrap();
        assert_eq!(remote.location(), "https://host/b.pdf");
        assert_eq!(remote.mime_type(), "application/pdf");
    }

    #[test]
    fn test_validation_rejects_blank_title() {
        let book = Book::new(BookId::from("1"), "   ");
        assert!(!book.is_valid());
    }

    #[test]
    fn test_validation_rejects_duplicate_identifier_labels() {
        let mut book = Book::new(BookId::from("1"), "Emma");
        book.identifier_list.push(Identifier::new("isbn", "1"));
        book.identifier_list.push(Identifier::new("isbn", "2"));
        assert!(!book.is_valid());
        assert_eq!(book.identifier("isbn"), Some("1"));
    }

    #[test]
    fn test_book_update_is_empty() {
        assert!(BookUpdate::default().is_empty());
        assert!(!BookUpdate::title("New").is_empty());
    }
}
