//! Book id to cover/file location lookups

use bookshelf_core::{Book, BookId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BookPaths {
    cover: Option<String>,
    file: Option<String>,
}

/// Locations of each book's cover and primary file, as of the last listing
#[derive(Debug, Default)]
pub struct BookPathCache {
    entries: RwLock<HashMap<BookId, BookPaths>>,
}

impl BookPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole cache with entries for `books`
    pub fn replace(&self, books: &[Book]) {
        let entries: HashMap<BookId, BookPaths> = books
            .iter()
            .filter_map(|book| {
                let paths = BookPaths {
                    cover: book.cover_image.as_ref().map(|cover| cover.location()),
                    file: book.primary_file().map(|file| file.location()),
                };
                (paths != BookPaths::default()).then(|| (book.id.clone(), paths))
            })
            .collect();

        log::debug!("Path cache now holds {} of {} books", entries.len(), books.len());
        *self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = entries;
    }

    pub fn cover_path(&self, id: &BookId) -> Option<String> {
        self.read().get(id).and_then(|paths| paths.cover.clone())
    }

    pub fn default_file_path(&self, id: &BookId) -> Option<String> {
        self.read().get(id).and_then(|paths| paths.file.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BookId, BookPaths>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::{BookFile, CoverImage, CoverKind};
    use std::path::PathBuf;

    fn book_with_file(id: &str, path: &str) -> Book {
        let mut book = Book::new(BookId::from(id), id);
        book.file_list.push(BookFile::Local {
            path: PathBuf::from(path),
            mime_type: "application/pdf".to_string(),
        });
        book
    }

    #[test]
    fn test_lookups_before_any_listing() {
        let cache = BookPathCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.cover_path(&BookId::from("1")), None);
        assert_eq!(cache.default_file_path(&BookId::from("1")), None);
    }

    #[test]
    fn test_replace_drops_stale_entries() {
        let cache = BookPathCache::new();
        cache.replace(&[book_with_file("1", "/a.pdf"), book_with_file("2", "/b.pdf")]);
        assert_eq!(cache.len(), 2);

        cache.replace(&[book_with_file("2", "/b2.pdf")]);
        assert_eq!(cache.default_file_path(&BookId::from("1")), None);
        assert_eq!(
            cache.default_file_path(&BookId::from("2")),
            Some("/b2.pdf".to_string())
        );
    }

    #[test]
    fn test_book_without_file_or_cover_has_no_entry() {
        let cache = BookPathCache::new();
        let mut covered = Book::new(BookId::from("c"), "Covered");
        covered.cover_image = Some(CoverImage {
            kind: CoverKind::Remote,
            url: "https://host/c.jpg".to_string(),
            local_path: None,
        });

        cache.replace(&[Book::new(BookId::from("bare"), "Bare"), covered]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.default_file_path(&BookId::from("c")), None);
        assert_eq!(
            cache.cover_path(&BookId::from("c")),
            Some("https://host/c.jpg".to_string())
        );
    }
}
