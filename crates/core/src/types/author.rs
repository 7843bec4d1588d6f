//! Author domain models

use crate::types::common::collect_errors;
use crate::types::Validator;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier for an author
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Creates a new random AuthorId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an identifier handed out by a backend
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AuthorId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for AuthorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A book author
///
/// `sortable_name` is the collation key ("Le Guin, Ursula K.") used for every
/// author-based ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub sortable_name: String,
}

impl Author {
    pub fn new(id: AuthorId, name: impl Into<String>, sortable_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sortable_name: sortable_name.into(),
        }
    }
}

impl Validator for Author {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Author name cannot be empty".to_string());
        }
        if self.sortable_name.trim().is_empty() {
            errors.push("Author sortable name cannot be empty".to_string());
        }
        collect_errors(errors)
    }
}

/// Partial update for an author; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable_name: Option<String>,
}

/// An author that does not exist in the library yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub sortable_name: String,
}

impl NewAuthor {
    /// Builds a new author, deriving the sortable name from the display name
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let sortable_name = sortable_name_for(&name);
        Self {
            name,
            sortable_name,
        }
    }
}

impl Validator for NewAuthor {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Author name cannot be empty".to_string());
        }
        if self.sortable_name.trim().is_empty() {
            errors.push("Author sortable name cannot be empty".to_string());
        }
        collect_errors(errors)
    }
}

/// Derives a "Last, First" collation key from a display name
///
/// Names that already contain a comma, and single-word names, are kept as is.
pub fn sortable_name_for(name: &str) -> String {
    let name = name.trim();
    if name.contains(',') {
        return name.to_string();
    }

    let mut parts: Vec<&str> = name.split_whitespace().collect();
    match parts.pop() {
        Some(last) if !parts.is_empty() => format!("{}, {}", last, parts.join(" ")),
        Some(only) => only.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_name_for() {
        assert_eq!(sortable_name_for("Ursula K. Le Guin"), "Guin, Ursula K. Le");
        assert_eq!(sortable_name_for("Jane Austen"), "Austen, Jane");
        assert_eq!(sortable_name_for("Homer"), "Homer");
        assert_eq!(sortable_name_for("Austen, Jane"), "Austen, Jane");
        assert_eq!(sortable_name_for("   "), "");
    }

    #[test]
    fn test_new_author_from_name() {
        let author = NewAuthor::from_name("Mary Shelley");
        assert_eq!(author.name, "Mary Shelley");
        assert_eq!(author.sortable_name, "Shelley, Mary");
        assert!(author.is_valid());
    }

    #[test]
    fn test_author_validation() {
        let author = Author::new(AuthorId::from("1"), "", "x");
        assert!(!author.is_valid());

        let author = Author::new(AuthorId::from("1"), "Jane Austen", "Austen, Jane");
        assert!(author.is_valid());
    }

    #[test]
    fn test_author_update_skips_unset_fields() {
        let update = AuthorUpdate {
            name: Some("Jane".to_string()),
            sortable_name: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Jane" }));
    }
}
