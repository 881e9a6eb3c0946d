// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use shelfmark_config::{Config, ConfigManager};
use shelfmark_library::{LibraryConfig, LibraryManager};
use std::path::PathBuf;

mod commands;

fn sort_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("sort")
            .short('s')
            .long("sort")
            .value_name("FIELD")
            .help("Sort by an integer field (id, author_id, book_id, condition, copy_id, member_id)"),
    )
    .arg(
        Arg::new("desc")
            .long("desc")
            .help("Sort in descending order")
            .action(ArgAction::SetTrue),
    )
}

fn id_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_name(value_name)
        .help(help)
        .value_parser(clap::value_parser!(i64))
}

fn remove_cmd(entity: &'static str, value_name: &'static str) -> Command {
    Command::new("remove")
        .about(format!("Remove a {}", entity))
        .arg(id_arg("id", value_name, "Id of the record to remove"))
}

pub(crate) fn build_cli() -> Command {
    Command::new("shelfmark")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Shelfmark Contributors")
        .about("Small library management: authors, books, copies, members and loans")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file (overrides the config file)")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .subcommand(
            Command::new("init").about("Write a default config file and create the database"),
        )
        .subcommand(
            Command::new("author")
                .about("Manage authors")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Register an author")
                        .arg(Arg::new("name").required(true).value_name("NAME").help("Author name")),
                )
                .subcommand(sort_args(Command::new("list").about("List authors")))
                .subcommand(remove_cmd("author and their books", "AUTHOR_ID")),
        )
        .subcommand(
            Command::new("book")
                .about("Manage books")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a book")
                        .arg(id_arg("author", "AUTHOR_ID", "Author of the book"))
                        .arg(Arg::new("title").required(true).value_name("TITLE").help("Book title"))
                        .arg(
                            Arg::new("description")
                                .long("description")
                                .value_name("TEXT")
                                .help("Short description"),
                        ),
                )
                .subcommand(
                    sort_args(Command::new("list").about("List books")).arg(
                        Arg::new("available")
                            .long("available")
                            .help("Only books with a copy on the shelf")
                            .action(ArgAction::SetTrue),
                    ),
                )
                .subcommand(
                    Command::new("search")
                        .about("Search books by title")
                        .arg(Arg::new("query").required(true).value_name("QUERY").help("Part of the title")),
                )
                .subcommand(remove_cmd("book and its copies", "BOOK_ID")),
        )
        .subcommand(
            Command::new("copy")
                .about("Manage physical copies")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a copy of a book")
                        .arg(id_arg("book", "BOOK_ID", "Book the copy belongs to"))
                        .arg(
                            Arg::new("condition")
                                .long("condition")
                                .value_name("N")
                                .help("Initial condition (defaults to lending.initial_condition)")
                                .value_parser(clap::value_parser!(i32)),
                        ),
                )
                .subcommand(
                    sort_args(Command::new("list").about("List copies")).arg(
                        Arg::new("book")
                            .long("book")
                            .value_name("BOOK_ID")
                            .help("Only copies of this book")
                            .value_parser(clap::value_parser!(i64)),
                    ),
                )
                .subcommand(remove_cmd("copy", "COPY_ID")),
        )
        .subcommand(
            Command::new("member")
                .about("Manage members")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Register a member")
                        .arg(Arg::new("name").required(true).value_name("NAME").help("Member name"))
                        .arg(Arg::new("ssn").required(true).value_name("SSN").help("Unique social security number")),
                )
                .subcommand(sort_args(Command::new("list").about("List members")))
                .subcommand(remove_cmd("member", "MEMBER_ID")),
        )
        .subcommand(
            Command::new("loan")
                .about("Lend and return copies")
                .subcommand_required(true)
                .subcommand(
                    Command::new("lend")
                        .about("Lend a copy to a member")
                        .arg(id_arg("copy", "COPY_ID", "Copy to lend"))
                        .arg(id_arg("member", "MEMBER_ID", "Borrowing member")),
                )
                .subcommand(
                    Command::new("return")
                        .about("Return a lent copy")
                        .arg(id_arg("id", "LOAN_ID", "Loan to close")),
                )
                .subcommand(
                    sort_args(Command::new("list").about("List loans")).arg(
                        Arg::new("open")
                            .long("open")
                            .help("Only loans that are not returned yet")
                            .action(ArgAction::SetTrue),
                    ),
                )
                .subcommand(remove_cmd("returned loan", "LOAN_ID"))
                .subcommand(Command::new("sweep").about("Flag lent copies whose loan is past due")),
        )
        .subcommand(Command::new("stats").about("Show library statistics"))
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<String>("config") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate the config directory")
}

/// Loads the config; problems are returned so they can be logged once logging is up
fn load_config(manager: &ConfigManager) -> (Config, Option<String>) {
    match manager.load_with_env_overrides() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e.to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = config_manager(&matches)?;
    let (mut config, config_problem) = load_config(&manager);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.as_filter()),
    )
    .init();

    if let Some(problem) = config_problem {
        log::warn!("Failed to load config: {}, using defaults", problem);
    }

    if let Some(path) = matches.get_one::<String>("database") {
        config.app.database_path = PathBuf::from(path);
    }

    let library = LibraryManager::new(LibraryConfig::from(&config))
        .await
        .context("Failed to open the library database")?;

    let result = match matches.subcommand() {
        Some(("init", _)) => commands::init(&manager, &library).await,
        Some(("author", sub)) => commands::author(&library, sub).await,
        Some(("book", sub)) => commands::book(&library, sub).await,
        Some(("copy", sub)) => commands::copy(&library, sub, &config).await,
        Some(("member", sub)) => commands::member(&library, sub).await,
        Some(("loan", sub)) => commands::loan(&library, sub).await,
        Some(("stats", _)) => commands::show_stats(&library).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    };

    library.close().await;

    if let Err(ref err) = result {
        if let Some(hint) = commands::storage_hint(err) {
            eprintln!("{} {}", console::style("hint:").yellow().bold(), hint);
        }
    }
    result
}
