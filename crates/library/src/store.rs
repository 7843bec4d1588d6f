//! Reactive cache of the active library's books and authors
//!
//! One [`LibraryStore`] is built at startup and shared. It owns the client for
//! the active library and publishes every state change over a
//! [`tokio::sync::watch`] channel. Mutations always go through the client and
//! are followed by a full reload of the affected collections; the store never
//! patches its snapshot in place.
//!
//! Reloads are stamped with a per-collection generation. A reload only applies
//! its result if no newer reload of the same collection was issued meanwhile,
//! so overlapping mutate-then-reload sequences settle on the last one issued.

use crate::error::{LibraryError, LibraryResult};
use bookshelf_client::{ClientFactory, LibraryClient};
use bookshelf_config::LibraryPath;
use bookshelf_core::events::{AuthorCreated, AuthorUpdated, BookCreated, BookUpdated};
use bookshelf_core::{
    Author, AuthorId, AuthorUpdate, Book, BookId, BookUpdate, EventEmitter,
    ImportableBookMetadata, NewAuthor,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{watch, Mutex};

/// Lifecycle of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Error,
}

/// Everything views read from the store
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub status: LibraryStatus,
    pub library_path: Option<LibraryPath>,
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
    pub books_loading: bool,
    pub authors_loading: bool,
    pub books_error: Option<String>,
    pub authors_error: Option<String>,
    pub library_error: Option<String>,
}

impl LibraryState {
    pub fn is_ready(&self) -> bool {
        self.status == LibraryStatus::Ready
    }

    pub fn book(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| &book.id == id)
    }
}

#[derive(Debug, Clone, Copy)]
enum Collection {
    Books,
    Authors,
}

/// Process-wide holder of the active library
pub struct LibraryStore {
    factory: Arc<dyn ClientFactory>,
    events: EventEmitter,
    state: watch::Sender<LibraryState>,
    client: RwLock<Option<Arc<dyn LibraryClient>>>,
    lifecycle: Mutex<()>,
    books_generation: AtomicU64,
    authors_generation: AtomicU64,
}

impl LibraryStore {
    pub fn new(factory: Arc<dyn ClientFactory>, events: EventEmitter) -> Self {
        let (state, _) = watch::channel(LibraryState::default());
        Self {
            factory,
            events,
            state,
            client: RwLock::new(None),
            lifecycle: Mutex::new(()),
            books_generation: AtomicU64::new(0),
            authors_generation: AtomicU64::new(0),
        }
    }

    /// Receiver that sees every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<LibraryState> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> LibraryState {
        self.state.borrow().clone()
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Client for the ready library
    pub fn client(&self) -> Option<Arc<dyn LibraryClient>> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Connects to `path` and loads its books and authors
    ///
    /// Does nothing if `path` is already the ready library. Any other
    /// library is reset first. On failure the store ends in
    /// [`LibraryStatus::Error`] with `library_error` set, and no client.
    pub async fn initialize(&self, path: LibraryPath) -> LibraryResult<()> {
        let _lifecycle = self.lifecycle.lock().await;

        {
            let state = self.state.borrow();
            if state.is_ready() && state.library_path.as_ref() == Some(&path) {
                log::debug!("Library '{}' already initialized", path.display_name);
                return Ok(());
            }
        }

        if self.state.borrow().status != LibraryStatus::Uninitialized {
            self.reset_locked();
        }

        log::info!("Initializing library '{}' ({})", path.display_name, path.connection);
        self.state.send_modify(|state| {
            state.status = LibraryStatus::Initializing;
            state.library_path = Some(path.clone());
            state.library_error = None;
        });

        let client = match self.factory.connect(&path).await {
            Ok(client) => client,
            Err(e) => {
                log::error!("Failed to open library '{}': {}", path.display_name, e);
                self.state.send_modify(|state| {
                    state.status = LibraryStatus::Error;
                    state.library_error = Some(e.to_string());
                });
                return Err(e.into());
            }
        };

        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(client);
        self.state
            .send_modify(|state| state.status = LibraryStatus::Ready);
        log::info!("Library '{}' ready", path.display_name);

        tokio::try_join!(self.load_books(), self.load_authors())?;
        Ok(())
    }

    /// Drops the client and all cached data
    pub async fn reset(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.reset_locked();
    }

    fn reset_locked(&self) {
        // Any reload still in flight is now stale
        self.books_generation.fetch_add(1, Ordering::SeqCst);
        self.authors_generation.fetch_add(1, Ordering::SeqCst);

        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        self.state.send_replace(LibraryState::default());
        log::info!("Library store reset");
    }

    /// Refetches every book
    ///
    /// A failed listing keeps the previous books and sets `books_error`.
    pub async fn load_books(&self) -> LibraryResult<()> {
        let client = self.ready_client()?;
        let generation = self.begin_load(Collection::Books);
        let result = client.list_books().await;

        self.state.send_if_modified(|state| {
            if self.is_stale(Collection::Books, generation) {
                log::debug!("Discarding stale book reload #{}", generation);
                return false;
            }
            state.books_loading = false;
            match result {
                Ok(books) => {
                    log::debug!("Loaded {} books", books.len());
                    state.books = books;
                    state.books_error = None;
                }
                Err(e) => {
                    log::warn!("Failed to load books: {}", e);
                    state.books_error = Some(e.to_string());
                }
            }
            true
        });
        Ok(())
    }

    /// Refetches every author
    ///
    /// A failed listing keeps the previous authors and sets `authors_error`.
    pub async fn load_authors(&self) -> LibraryResult<()> {
        let client = self.ready_client()?;
        let generation = self.begin_load(Collection::Authors);
        let result = client.list_authors().await;

        self.state.send_if_modified(|state| {
            if self.is_stale(Collection::Authors, generation) {
                log::debug!("Discarding stale author reload #{}", generation);
                return false;
            }
            state.authors_loading = false;
            match result {
                Ok(authors) => {
                    log::debug!("Loaded {} authors", authors.len());
                    state.authors = authors;
                    state.authors_error = None;
                }
                Err(e) => {
                    log::warn!("Failed to load authors: {}", e);
                    state.authors_error = Some(e.to_string());
                }
            }
            true
        });
        Ok(())
    }

    pub async fn update_book(&self, id: &BookId, update: &BookUpdate) -> LibraryResult<()> {
        let client = self.ready_client()?;
        client.update_book(id, update).await?;
        self.load_books().await?;
        self.events.emit(BookUpdated { book_id: id.clone() });
        Ok(())
    }

    pub async fn update_author(&self, id: &AuthorId, update: &AuthorUpdate) -> LibraryResult<()> {
        let client = self.ready_client()?;
        client.update_author(id, update).await?;
        self.reload_all().await?;
        self.events.emit(AuthorUpdated {
            author_id: id.clone(),
        });
        Ok(())
    }

    pub async fn create_authors(&self, authors: &[NewAuthor]) -> LibraryResult<Vec<Author>> {
        let client = self.ready_client()?;
        let created = client.create_authors(authors).await?;
        self.load_authors().await?;
        self.events.emit(AuthorCreated {
            author_ids: created.iter().map(|author| author.id.clone()).collect(),
        });
        Ok(created)
    }

    pub async fn delete_author(&self, id: &AuthorId) -> LibraryResult<()> {
        let client = self.ready_client()?;
        client.delete_author(id).await?;
        self.reload_all().await?;
        self.events.emit(AuthorUpdated {
            author_id: id.clone(),
        });
        Ok(())
    }

    /// Adds a book from import metadata, returning its id if one was created
    pub async fn add_book(&self, metadata: &ImportableBookMetadata) -> LibraryResult<Option<BookId>> {
        let client = self.ready_client()?;
        let Some(book_id) = client.add_importable_file_by_metadata(metadata).await? else {
            log::info!("Nothing added for {}", metadata.file.path.display());
            return Ok(None);
        };

        // New books may bring new authors with them
        self.reload_all().await?;
        self.events.emit(BookCreated {
            book_id: book_id.clone(),
        });
        Ok(Some(book_id))
    }

    pub async fn upsert_book_identifier(
        &self,
        book_id: &BookId,
        label: &str,
        value: &str,
    ) -> LibraryResult<()> {
        let client = self.ready_client()?;
        client.upsert_book_identifier(book_id, label, value).await?;
        self.load_books().await?;
        self.events.emit(BookUpdated {
            book_id: book_id.clone(),
        });
        Ok(())
    }

    pub async fn delete_book_identifier(&self, book_id: &BookId, label: &str) -> LibraryResult<()> {
        let client = self.ready_client()?;
        client.delete_book_identifier(book_id, label).await?;
        self.load_books().await?;
        self.events.emit(BookUpdated {
            book_id: book_id.clone(),
        });
        Ok(())
    }

    async fn reload_all(&self) -> LibraryResult<()> {
        tokio::try_join!(self.load_authors(), self.load_books())?;
        Ok(())
    }

    fn ready_client(&self) -> LibraryResult<Arc<dyn LibraryClient>> {
        if !self.state.borrow().is_ready() {
            return Err(LibraryError::NotReady);
        }
        self.client().ok_or(LibraryError::NotReady)
    }

    fn generation(&self, collection: Collection) -> &AtomicU64 {
        match collection {
            Collection::Books => &self.books_generation,
            Collection::Authors => &self.authors_generation,
        }
    }

    fn begin_load(&self, collection: Collection) -> u64 {
        let generation = self.generation(collection).fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| match collection {
            Collection::Books => state.books_loading = true,
            Collection::Authors => state.authors_loading = true,
        });
        generation
    }

    fn is_stale(&self, collection: Collection, generation: u64) -> bool {
        self.generation(collection).load(Ordering::SeqCst) != generation
    }
}
