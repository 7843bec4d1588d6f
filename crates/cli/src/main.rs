use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

mod commands;

fn build_cli() -> Command {
    Command::new("bookshelf")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Bookshelf Contributors")
        .about("E-book library manager")
        .arg(
            Arg::new("settings-dir")
                .long("settings-dir")
                .value_name("DIR")
                .help("Directory holding the settings (defaults to the platform config directory)")
                .global(true),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .value_name("BACKEND")
                .help("Settings backend to use")
                .value_parser(["store", "web"])
                .global(true),
        )
        .subcommand(Command::new("libraries").about("List known libraries"))
        .subcommand(
            Command::new("add-library")
                .about("Remember a library and make it active if none is")
                .arg(Arg::new("name").required(true).value_name("NAME").help("Display name"))
                .arg(Arg::new("path").value_name("PATH").help("Library directory, or server url for remote libraries (prompted for when omitted)"))
                .arg(
                    Arg::new("connection")
                        .short('c')
                        .long("connection")
                        .value_name("KIND")
                        .help("How to reach the library")
                        .value_parser(["local", "remote", "embedded"])
                        .default_value("local"),
                )
                .arg(Arg::new("create").long("create").help("Create an empty library at PATH first").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("remove-library")
                .about("Forget a library")
                .arg(Arg::new("id").required(true).value_name("LIBRARY_ID")),
        )
        .subcommand(
            Command::new("use")
                .about("Make a known library the active one")
                .arg(Arg::new("id").required(true).value_name("LIBRARY_ID")),
        )
        .subcommand(
            Command::new("list")
                .about("List books in the active library")
                .arg(
                    Arg::new("sort")
                        .short('s')
                        .long("sort")
                        .value_name("ORDER")
                        .value_parser(["name-az", "name-za", "author-az", "author-za"])
                        .default_value("name-az"),
                )
                .arg(Arg::new("query").short('q').long("query").value_name("QUERY").help("Only books whose title or authors contain QUERY")),
        )
        .subcommand(Command::new("authors").about("List authors in the active library"))
        .subcommand(
            Command::new("import")
                .about("Add a book file to the active library")
                .arg(Arg::new("file").value_name("FILE").help("Book file (prompted for when omitted)")),
        )
        .subcommand(
            Command::new("set-title")
                .about("Rename a book")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Book ID, or a prefix only one book has"))
                .arg(Arg::new("title").required(true).value_name("TITLE")),
        )
        .subcommand(
            Command::new("identifier")
                .about("Set a book identifier, or delete it when no value is given")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Book ID, or a prefix only one book has"))
                .arg(Arg::new("label").required(true).value_name("LABEL").help("Identifier kind, e.g. isbn"))
                .arg(Arg::new("value").value_name("VALUE")),
        )
        .subcommand(Command::new("settings").about("Print the current settings"))
        .subcommand(
            Command::new("theme")
                .about("Change the theme")
                .arg(Arg::new("theme").required(true).value_name("THEME").value_parser(["light", "dark", "system"])),
        )
}

async fn run(matches: ArgMatches) -> Result<()> {
    let ctx = commands::AppContext::open(&matches)
        .await
        .context("Failed to load settings")?;

    match matches.subcommand() {
        Some(("libraries", _)) => commands::list_libraries(&ctx),
        Some(("add-library", sub_matches)) => commands::add_library(&ctx, sub_matches).await,
        Some(("remove-library", sub_matches)) => commands::remove_library(&ctx, sub_matches).await,
        Some(("use", sub_matches)) => commands::use_library(&ctx, sub_matches).await,
        Some(("list", sub_matches)) => commands::list_books(&ctx, sub_matches).await,
        Some(("authors", _)) => commands::list_authors(&ctx).await,
        Some(("import", sub_matches)) => commands::import_book(&ctx, sub_matches).await,
        Some(("set-title", sub_matches)) => commands::set_title(&ctx, sub_matches).await,
        Some(("identifier", sub_matches)) => commands::set_identifier(&ctx, sub_matches).await,
        Some(("settings", _)) => commands::show_settings(&ctx),
        Some(("theme", sub_matches)) => commands::set_theme(&ctx, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let result = run(build_cli().get_matches()).await;
    if let Err(err) = &result {
        if let Some(cause) = commands::catalog_error(err) {
            log::debug!("{} catalog failure: {}", cause.severity(), cause);
            eprintln!("{} {}", console::style("Hint:").yellow().bold(), cause.user_message());
        }
    }
    result
}
