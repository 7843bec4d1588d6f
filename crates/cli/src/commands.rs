use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bookshelf_client::{
    CatalogHost, ClientError, CommandHost, ConnectionFactory, EmbeddedClient, LibraryClient,
    LocalClient,
};
use bookshelf_config::{BackendKind, LibraryPath, SettingsManager, Theme, ThemeKey};
use bookshelf_core::events::{AuthorCreated, BookUpdated};
use bookshelf_core::{AppError, Book, BookId, BookUpdate, ConnectionKind, EventEmitter};
use bookshelf_library::{
    commit_import, format_author_list, prompt_for_library_directory, prompt_to_add_book,
    BookQuery, DialogSelection, FileFilter, FilePicker, LibraryError, LibraryResult,
    LibraryStore, SortOrder, TerminalPicker,
};
use clap::ArgMatches;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;


/// Settings plus the means to open libraries
pub struct AppContext {
    settings: SettingsManager,
    host: Arc<dyn CommandHost>,
    events: EventEmitter,
}

impl AppContext {
    pub async fn open(matches: &ArgMatches) -> Result<Self> {
        let kind = match matches.get_one::<String>("backend") {
            Some(name) => name.parse::<BackendKind>()?,
            None => BackendKind::detect(),
        };
        let dir = matches.get_one::<String>("settings-dir").map(PathBuf::from);

        let settings = SettingsManager::open(kind, dir)?;
        settings.initialize().await?;

        Ok(Self {
            settings,
            host: Arc::new(CatalogHost::new()),
            events: EventEmitter::new(),
        })
    }

    /// Store initialized with the active library
    async fn open_store(&self) -> Result<LibraryStore> {
        let path = self.settings.active_library()?.ok_or_else(|| {
            anyhow!("No active library. Add one with 'add-library' or pick one with 'use'")
        })?;

        let factory = ConnectionFactory::new().with_host(Arc::clone(&self.host));
        let store = LibraryStore::new(Arc::new(factory), self.events.clone());
        store
            .initialize(path.clone())
            .await
            .with_context(|| format!("Failed to open library '{}'", path.display_name))?;
        Ok(store)
    }
}

/// Picker that already knows its answer
struct GivenFile(PathBuf);

#[async_trait]
impl FilePicker for GivenFile {
    async fn pick_file(&self, _filters: &[FileFilter]) -> LibraryResult<DialogSelection> {
        Ok(DialogSelection::Single(self.0.clone()))
    }

    async fn pick_directory(&self) -> LibraryResult<DialogSelection> {
        Ok(DialogSelection::Single(self.0.clone()))
    }
}

/// List known libraries
pub fn list_libraries(ctx: &AppContext) -> Result<()> {
    let paths = ctx.settings.library_paths()?;
    if paths.is_empty() {
        println!("No libraries yet. Use 'add-library' to add one.");
        return Ok(());
    }

    let active = ctx.settings.active_library()?.map(|path| path.id);
    println!("\n{} Libraries", style(paths.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for path in paths {
        let marker = if active.as_deref() == Some(path.id.as_str()) {
            style("*").green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {} [{}] {}",
            marker,
            style(&path.display_name).bold(),
            path.connection,
            path.absolute_path
        );
        println!("    ID: {}", path.id);
    }
    Ok(())
}

/// Remember a library, asking for its directory if none was given
pub async fn add_library(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    match matches.get_one::<String>("path") {
        Some(path) => add_library_at(ctx, matches, Some(PathBuf::from(path))).await,
        None => {
            let picked = prompt_for_library_directory(&TerminalPicker::new()).await?;
            add_library_at(ctx, matches, picked).await
        }
    }
}

async fn add_library_at(ctx: &AppContext, matches: &ArgMatches, location: Option<PathBuf>) -> Result<()> {
    let name = required(matches, "name")?;
    let connection: ConnectionKind = required(matches, "connection")?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let Some(location) = location else {
        println!("No library added.");
        return Ok(());
    };

    if matches.get_flag("create") {
        create_library(ctx, connection, &location).await?;
    }

    let location = match connection {
        ConnectionKind::Remote => location.display().to_string(),
        ConnectionKind::Local | ConnectionKind::Embedded => {
            absolute_library_path(&location)?.display().to_string()
        }
    };
    let stored = ctx
        .settings
        .add_library_path(LibraryPath::new(name, location, connection))
        .await
        .context("Failed to save library")?;
    if ctx.settings.active_library()?.is_none() {
        ctx.settings.set_active_library(&stored.id).await?;
    }

    println!("{} Library '{}' saved", style("✓").green().bold(), stored.display_name);
    println!("  ID: {}", stored.id);
    println!("  Path: {}", stored.absolute_path);
    Ok(())
}

/// Resolves symlinks and `..` for an existing directory, otherwise anchors it at the working directory
fn absolute_library_path(location: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(location) {
        Ok(path) => Ok(path),
        Err(_) => std::path::absolute(location)
            .with_context(|| format!("Failed to resolve {}", location.display())),
    }
}

async fn create_library(ctx: &AppContext, connection: ConnectionKind, root: &Path) -> Result<()> {
    match connection {
        ConnectionKind::Local => LocalClient::create_library(ctx.host.as_ref(), root).await?,
        ConnectionKind::Embedded => EmbeddedClient::create(root).await?.close().await,
        ConnectionKind::Remote => bail!("Remote libraries are created on their server"),
    }
    println!("Created library at {}", root.display());
    Ok(())
}

/// Forget a library
pub async fn remove_library(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = required(matches, "id")?;
    if !ctx.settings.remove_library_path(id).await? {
        bail!("No library with ID {}", id);
    }
    println!("{} Library removed", style("✓").green().bold());
    Ok(())
}

/// Switch the active library
pub async fn use_library(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let path = ctx.settings.set_active_library(required(matches, "id")?).await?;
    println!("{} Now using '{}'", style("✓").green().bold(), path.display_name);
    Ok(())
}

/// List books in the active library
pub async fn list_books(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let order: SortOrder = required(matches, "sort")?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let query = BookQuery::new(matches.get_one::<String>("query").map_or("", String::as_str));

    let store = ctx.open_store().await?;
    let state = store.snapshot();
    if let Some(error) = &state.books_error {
        bail!("Failed to load books: {}", error);
    }

    let books = query.apply(&state.books, order);
    if books.is_empty() {
        println!("No books found. Use 'import' to add one.");
        return Ok(());
    }

    println!("\n{} Books ({})", style(books.len()).bold().cyan(), order);
    println!("{}", "=".repeat(80));
    let client = store.client();
    for book in &books {
        let file = client
            .as_ref()
            .and_then(|client| client.default_file_path_for_book(&book.id));
        println!("{}", book_summary(book, file.as_deref()));
    }
    Ok(())
}

/// List authors in the active library
pub async fn list_authors(ctx: &AppContext) -> Result<()> {
    let store = ctx.open_store().await?;
    let state = store.snapshot();
    if let Some(error) = &state.authors_error {
        bail!("Failed to load authors: {}", error);
    }

    println!("\n{} Authors", style(state.authors.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for author in &state.authors {
        println!("{} ({})", style(&author.name).bold(), author.sortable_name);
        println!("  ID: {}", author.id);
    }
    Ok(())
}

/// Import a book file, asking for one if none was given
pub async fn import_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let store = ctx.open_store().await?;
    let client = store.client().ok_or_else(|| anyhow!("Library is not ready"))?;

    let metadata = match matches.get_one::<String>("file") {
        Some(file) => prompt_to_add_book(client.as_ref(), &GivenFile(PathBuf::from(file))).await?,
        None => prompt_to_add_book(client.as_ref(), &TerminalPicker::new()).await?,
    };
    let Some(metadata) = metadata else {
        println!("Nothing imported.");
        return Ok(());
    };

    let _subscription = ctx.events.listen::<AuthorCreated, _>(|event| {
        log::info!("{} new author(s)", event.author_ids.len());
    });
    match commit_import(&store, &metadata).await? {
        Some(id) => {
            println!("{} Imported '{}'", style("✓").green().bold(), metadata.title);
            println!("  ID: {}", id);
            if !metadata.author_list.is_empty() {
                println!("  Authors: {}", metadata.author_list.join(", "));
            }
        }
        None => println!("Nothing imported."),
    }
    Ok(())
}

/// Rename a book
pub async fn set_title(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let title = required(matches, "title")?;

    let store = ctx.open_store().await?;
    let id = resolve_book(&store, required(matches, "id")?)?;

    let subscription = ctx.events.listen::<BookUpdated, _>(|event| {
        log::debug!("Book {} updated", event.book_id);
    });
    store
        .update_book(&id, &BookUpdate::title(title))
        .await
        .context("Failed to update book")?;
    subscription.unsubscribe();

    println!("{} Renamed to '{}'", style("✓").green().bold(), title);
    Ok(())
}

/// Set or delete a book identifier
pub async fn set_identifier(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let label = required(matches, "label")?;

    let store = ctx.open_store().await?;
    let id = resolve_book(&store, required(matches, "id")?)?;

    match matches.get_one::<String>("value") {
        Some(value) => {
            store.upsert_book_identifier(&id, label, value).await?;
            println!("{} {} set to {}", style("✓").green().bold(), label, value);
        }
        None => {
            store.delete_book_identifier(&id, label).await?;
            println!("{} {} removed", style("✓").green().bold(), label);
        }
    }
    Ok(())
}

/// Print the settings record
pub fn show_settings(ctx: &AppContext) -> Result<()> {
    let settings = ctx.settings.settings()?;
    println!("{}", style("Settings").bold().cyan());
    println!("Backend: {}", ctx.settings.backend_kind());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Change the theme
pub async fn set_theme(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let theme: Theme = required(matches, "theme")?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    ctx.settings.set::<ThemeKey>(theme).await?;
    println!("{} Theme set to {}", style("✓").green().bold(), theme);
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} is required", name))
}

/// Finds a book by its full id, or by a prefix only one book starts with
fn resolve_book(store: &LibraryStore, given: &str) -> Result<BookId> {
    let state = store.snapshot();
    if let Some(book) = state.book(&BookId::from(given)) {
        return Ok(book.id.clone());
    }

    let matches: Vec<&Book> = state
        .books
        .iter()
        .filter(|book| !given.is_empty() && book.id.as_str().starts_with(given))
        .collect();
    match matches.as_slice() {
        [book] => Ok(book.id.clone()),
        [] => bail!("No book with ID {}", given),
        several => bail!("ID {} matches {} books; give more of it", given, several.len()),
    }
}

/// Catalog error somewhere in the chain, if the failure came from one
pub fn catalog_error(err: &anyhow::Error) -> Option<&AppError> {
    for cause in err.chain() {
        if let Some(app) = cause.downcast_ref::<AppError>() {
            return Some(app);
        }
        if let Some(ClientError::Database(app)) = cause.downcast_ref::<ClientError>() {
            return Some(app);
        }
        if let Some(LibraryError::Client(ClientError::Database(app))) = cause.downcast_ref::<LibraryError>() {
            return Some(app);
        }
    }
    None
}

fn book_summary(book: &Book, file: Option<&str>) -> String {
    let mut lines = vec![format!("\n{}", style(&book.title).bold())];
    if !book.author_list.is_empty() {
        lines.push(format!("  by {}", format_author_list(&book.author_list)));
    }
    lines.push(format!("  ID: {}", book.id));
    if !book.identifier_list.is_empty() {
        let identifiers: Vec<String> = book
            .identifier_list
            .iter()
            .map(|identifier| format!("{}:{}", identifier.label, identifier.value))
            .collect();
        lines.push(format!("  {}", identifiers.join(" ")));
    }
    if let Some(file) = file {
        lines.push(format!("  File: {}", file));
    }
    lines.join("\n")
}
