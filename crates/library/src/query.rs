//! Display helpers, sorting and filtering over a book snapshot

use bookshelf_core::{Author, Book};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Author names joined with ", " in the order given
pub fn format_author_list(authors: &[Author]) -> String {
    authors
        .iter()
        .map(|author| author.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Orderings offered for the book list
///
/// Every order is total: ties on the sort key fall back to the book id, and
/// each `Za` order is the exact reverse of its `Az` counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NameAz,
    NameZa,
    AuthorAz,
    AuthorZa,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [Self::NameAz, Self::NameZa, Self::AuthorAz, Self::AuthorZa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameAz => "name-az",
            Self::NameZa => "name-za",
            Self::AuthorAz => "author-az",
            Self::AuthorZa => "author-za",
        }
    }

    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        match self {
            Self::NameAz => by_name(a, b),
            Self::NameZa => by_name(b, a),
            Self::AuthorAz => by_author(a, b),
            Self::AuthorZa => by_author(b, a),
        }
    }

    pub fn sort(&self, books: &mut [Book]) {
        books.sort_by(|a, b| self.compare(a, b));
    }
}

fn by_name(a: &Book, b: &Book) -> Ordering {
    a.sort_title()
        .to_lowercase()
        .cmp(&b.sort_title().to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

// Books without authors come first
fn by_author(a: &Book, b: &Book) -> Ordering {
    let key = |book: &Book| {
        book.author_list
            .first()
            .map(|author| author.sortable_name.to_lowercase())
    };
    key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == normalized || order.as_str().replace('-', "") == normalized)
            .ok_or_else(|| format!("Unknown sort order '{}'", s))
    }
}

/// Case-insensitive substring filter over titles and author names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    needle: String,
}

impl BookQuery {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.is_empty()
            || book.title.to_lowercase().contains(&self.needle)
            || book
                .author_list
                .iter()
                .any(|author| author.name.to_lowercase().contains(&self.needle))
    }

    /// Books matching this query, in `order`
    pub fn apply(&self, books: &[Book], order: SortOrder) -> Vec<Book> {
        let mut matched: Vec<Book> = books
            .iter()
            .filter(|book| self.matches(book))
            .cloned()
            .collect();
        order.sort(&mut matched);
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::{AuthorId, BookId};

    fn author(id: &str, name: &str, sortable: &str) -> Author {
        Author::new(AuthorId::from(id), name, sortable)
    }

    fn book(id: &str, title: &str, authors: Vec<Author>) -> Book {
        let mut book = Book::new(BookId::from(id), title);
        book.author_list = authors;
        book
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.id.as_str()).collect()
    }

    #[test]
    fn test_format_author_list_keeps_order() {
        let a = author("a", "Terry Pratchett", "Pratchett, Terry");
        let b = author("b", "Neil Gaiman", "Gaiman, Neil");

        assert_eq!(format_author_list(&[a.clone(), b.clone()]), "Terry Pratchett, Neil Gaiman");
        assert_eq!(format_author_list(&[b, a]), "Neil Gaiman, Terry Pratchett");
        assert_eq!(format_author_list(&[]), "");
    }

    #[test]
    fn test_name_sort_uses_sortable_title() {
        let mut hobbit = book("1", "The Hobbit", vec![]);
        hobbit.sortable_title = Some("Hobbit, The".to_string());
        let mut books = vec![book("2", "ivanhoe", vec![]), hobbit, book("3", "Emma", vec![])];

        SortOrder::NameAz.sort(&mut books);
        assert_eq!(ids(&books), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_ties_break_on_id() {
        let mut books = vec![book("b", "Emma", vec![]), book("a", "emma", vec![])];
        SortOrder::NameAz.sort(&mut books);
        assert_eq!(ids(&books), vec!["a", "b"]);

        SortOrder::NameZa.sort(&mut books);
        assert_eq!(ids(&books), vec!["b", "a"]);
    }

    #[test]
    fn test_author_orders_are_reverses() {
        let austen = author("a", "Jane Austen", "Austen, Jane");
        let bronte = author("b", "Charlotte Brontë", "Brontë, Charlotte");
        let eliot = author("c", "George Eliot", "Eliot, George");
        let books = vec![
            book("1", "Middlemarch", vec![eliot]),
            book("2", "Beowulf", vec![]),
            book("3", "Emma", vec![austen.clone()]),
            book("4", "Jane Eyre", vec![bronte, austen]),
        ];

        let mut ascending = books.clone();
        SortOrder::AuthorAz.sort(&mut ascending);
        assert_eq!(ids(&ascending), vec!["2", "3", "4", "1"]);

        let mut descending = books;
        SortOrder::AuthorZa.sort(&mut descending);
        let mut reversed = ids(&ascending);
        reversed.reverse();
        assert_eq!(ids(&descending), reversed);
    }

    #[test]
    fn test_parse_sort_order() {
        assert_eq!("name-az".parse::<SortOrder>().unwrap(), SortOrder::NameAz);
        assert_eq!("authorZa".parse::<SortOrder>().unwrap(), SortOrder::AuthorZa);
        assert_eq!("AUTHOR_AZ".parse::<SortOrder>().unwrap(), SortOrder::AuthorAz);
        assert!("newest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_query_matches_title_and_author() {
        let books = vec![
            book("1", "Good Omens", vec![author("a", "Neil Gaiman", "Gaiman, Neil")]),
            book("2", "Coraline", vec![author("a", "Neil Gaiman", "Gaiman, Neil")]),
            book("3", "Mort", vec![author("b", "Terry Pratchett", "Pratchett, Terry")]),
        ];

        assert_eq!(ids(&BookQuery::new("GAIMAN").apply(&books, SortOrder::NameAz)), vec!["2", "1"]);
        assert_eq!(ids(&BookQuery::new("omens").apply(&books, SortOrder::NameAz)), vec!["1"]);
        assert_eq!(BookQuery::new("  ").apply(&books, SortOrder::NameAz).len(), 3);
    }
}
