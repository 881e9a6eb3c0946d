// FILE: crates/cli/src/commands.rs

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use console::style;
use shelfmark_config::{Config, ConfigManager};
use shelfmark_core::{
    AppError, Author, AuthorId, Book, BookCopy, BookId, CopyId, CopyState, Loan, LoanId, Member, MemberId,
    NewAuthor, NewBook, NewBookCopy, NewMember, SortOrder, Timestamp,
};
use shelfmark_library::LibraryManager;


/// Write the default config file and check the database created on startup
pub async fn init(manager: &ConfigManager, library: &LibraryManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write the config file")?;

    if created {
        println!(
            "{} Config written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", manager.config_path().display());
    }
    let schema = library
        .verify()
        .await
        .context("Database integrity check failed")?;
    println!(
        "{} Database ready at {} (schema version {})",
        style("✓").green().bold(),
        library.config().database_path,
        schema
    );
    Ok(())
}

/// Friendly message and next step for a failure rooted in the database layer
pub fn storage_hint(err: &anyhow::Error) -> Option<String> {
    let app = err.chain().find_map(|cause| cause.downcast_ref::<AppError>())?;

    if app.is_critical() {
        log::error!("{} failure: {}", app.severity(), app);
    } else if app.is_retryable() {
        log::warn!("Transient database failure: {}", app);
    }
    Some(format!("{} {}.", app.user_message(), app.recovery_action()))
}

pub async fn author(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let authors = library.authors();
    match matches.subcommand() {
        Some(("add", sub)) => {
            let name = required_str(sub, "name")?;
            let author = authors
                .add(NewAuthor::new(name))
                .await
                .context("Failed to add author")?;
            println!("{} Author added: [{}] {}", style("✓").green().bold(), author.id, author.name);
        }
        Some(("list", sub)) => {
            let list = match sort_choice(sub) {
                Some((field, order)) => authors.sorted(field, order).await?,
                None => authors.all().await?,
            };
            print_section("Authors", list.len());
            for author in &list {
                println!("{}", format_author(author));
            }
        }
        Some(("remove", sub)) => {
            let id = AuthorId::new(required_id(sub, "id")?);
            authors.remove(id).await.context("Failed to remove author")?;
            println!("{} Author {} removed", style("✓").green().bold(), id);
        }
        _ => return Err(anyhow!("Unknown author command")),
    }
    Ok(())
}

pub async fn book(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let books = library.books();
    match matches.subcommand() {
        Some(("add", sub)) => {
            let author_id = AuthorId::new(required_id(sub, "author")?);
            let mut draft = NewBook::new(author_id, required_str(sub, "title")?);
            if let Some(description) = sub.get_one::<String>("description") {
                draft = draft.with_description(description.as_str());
            }

            let book = books.add(draft).await.context("Failed to add book")?;
            println!("{} Book added: [{}] {}", style("✓").green().bold(), book.id, book.title);
        }
        Some(("list", sub)) => {
            let mut list = match sort_choice(sub) {
                Some((field, order)) => books.sorted(field, order).await?,
                None => books.all().await?,
            };
            if sub.get_flag("available") {
                let available = books.available_books().await?;
                list.retain(|book| available.iter().any(|a| a.id == book.id));
            }

            print_section("Books", list.len());
            for book in &list {
                println!("{}", format_book(book));
            }
        }
        Some(("search", sub)) => {
            let query = required_str(sub, "query")?;
            let results = books.search_title(query).await.context("Failed to search books")?;

            if results.is_empty() {
                println!("No books found matching '{}'", query);
                return Ok(());
            }
            print_section(&format!("Search Results for '{}'", query), results.len());
            for book in &results {
                println!("{}", format_book(book));
            }
        }
        Some(("remove", sub)) => {
            let id = BookId::new(required_id(sub, "id")?);
            books.remove(id).await.context("Failed to remove book")?;
            println!("{} Book {} removed", style("✓").green().bold(), id);
        }
        _ => return Err(anyhow!("Unknown book command")),
    }
    Ok(())
}

pub async fn copy(library: &LibraryManager, matches: &ArgMatches, config: &Config) -> Result<()> {
    let copies = library.copies();
    match matches.subcommand() {
        Some(("add", sub)) => {
            let book_id = BookId::new(required_id(sub, "book")?);
            let condition = sub
                .get_one::<i32>("condition")
                .copied()
                .unwrap_or(config.lending.initial_condition);

            let copy = copies
                .add(NewBookCopy::new(book_id, condition))
                .await
                .context("Failed to add copy")?;
            println!(
                "{} Copy {} of book {} added (condition {})",
                style("✓").green().bold(),
                copy.id,
                copy.book_id,
                copy.condition
            );
        }
        Some(("list", sub)) => {
            library.loans().mark_overdue(Timestamp::now()).await?;

            let mut list = match sort_choice(sub) {
                Some((field, order)) => copies.sorted(field, order).await?,
                None => copies.all().await?,
            };
            if let Some(book) = sub.get_one::<i64>("book") {
                list.retain(|copy| copy.book_id == BookId::new(*book));
            }

            print_section("Copies", list.len());
            for copy in &list {
                println!("{}", format_copy(copy));
            }
        }
        Some(("remove", sub)) => {
            let id = CopyId::new(required_id(sub, "id")?);
            copies.remove(id).await.context("Failed to remove copy")?;
            println!("{} Copy {} removed", style("✓").green().bold(), id);
        }
        _ => return Err(anyhow!("Unknown copy command")),
    }
    Ok(())
}

pub async fn member(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let members = library.members();
    match matches.subcommand() {
        Some(("add", sub)) => {
            let draft = NewMember::new(required_str(sub, "name")?, required_str(sub, "ssn")?);
            let member = members.add(draft).await.context("Failed to add member")?;
            println!("{} Member added: [{}] {}", style("✓").green().bold(), member.id, member);
        }
        Some(("list", sub)) => {
            let list = match sort_choice(sub) {
                Some((field, order)) => members.sorted(field, order).await?,
                None => members.all().await?,
            };
            print_section("Members", list.len());
            for member in &list {
                println!("{}", format_member(member));
            }
        }
        Some(("remove", sub)) => {
            let id = MemberId::new(required_id(sub, "id")?);
            members.remove(id).await.context("Failed to remove member")?;
            println!("{} Member {} removed", style("✓").green().bold(), id);
        }
        _ => return Err(anyhow!("Unknown member command")),
    }
    Ok(())
}

pub async fn loan(library: &LibraryManager, matches: &ArgMatches) -> Result<()> {
    let loans = library.loans();
    match matches.subcommand() {
        Some(("lend", sub)) => {
            let copy_id = CopyId::new(required_id(sub, "copy")?);
            let member_id = MemberId::new(required_id(sub, "member")?);

            let loan = loans
                .create_loan(copy_id, member_id)
                .await
                .context("Failed to lend copy")?;
            println!(
                "{} Loan {} opened, due {}",
                style("✓").green().bold(),
                loan.id,
                format_date(loan.due_at)
            );
        }
        Some(("return", sub)) => {
            let id = LoanId::new(required_id(sub, "id")?);
            let outcome = loans.return_loan(id).await.context("Failed to return loan")?;

            println!(
                "{} Loan {} returned, copy {} condition now {}",
                style("✓").green().bold(),
                id,
                outcome.copy.id,
                outcome.copy.condition
            );
            if let Some(notice) = outcome.notice {
                println!("  {} {}", style("!").yellow().bold(), notice);
            }
        }
        Some(("list", sub)) => {
            let now = Timestamp::now();
            loans.mark_overdue(now).await?;

            let mut list = match sort_choice(sub) {
                Some((field, order)) => loans.sorted(field, order).await?,
                None => loans.all().await?,
            };
            if sub.get_flag("open") {
                list.retain(Loan::is_open);
            }

            print_section("Loans", list.len());
            for loan in &list {
                println!("{}", format_loan(loan, now));
            }
        }
        Some(("remove", sub)) => {
            let id = LoanId::new(required_id(sub, "id")?);
            loans.remove_loan(id).await.context("Failed to remove loan")?;
            println!("{} Loan {} removed", style("✓").green().bold(), id);
        }
        Some(("sweep", _)) => {
            let flagged = loans.mark_overdue(Timestamp::now()).await?;
            println!("{} {} copy(ies) flagged overdue", style("✓").green().bold(), flagged);
        }
        _ => return Err(anyhow!("Unknown loan command")),
    }
    Ok(())
}

/// Show library statistics
pub async fn show_stats(library: &LibraryManager) -> Result<()> {
    let stats = library
        .stats(Timestamp::now())
        .await
        .context("Failed to collect statistics")?;

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Authors: {}", style(stats.authors).bold());
    println!("Books: {}", style(stats.books).bold());
    println!(
        "Copies: {} ({} on the shelf)",
        style(stats.copies).bold(),
        stats.available_copies
    );
    println!("Members: {}", style(stats.members).bold());
    println!("Open Loans: {}", style(stats.open_loans).bold());
    println!("Overdue Loans: {}", style(stats.overdue_loans).bold());
    Ok(())
}

fn required_str<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("{} is required", name))
}

fn required_id(matches: &ArgMatches, name: &str) -> Result<i64> {
    matches
        .get_one::<i64>(name)
        .copied()
        .ok_or_else(|| anyhow!("{} is required", name))
}

fn sort_choice(matches: &ArgMatches) -> Option<(&str, SortOrder)> {
    let field = matches.get_one::<String>("sort")?;
    let order = if matches.get_flag("desc") {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    Some((field.as_str(), order))
}

fn print_section(title: &str, count: usize) {
    println!("\n{} {}", style(count).bold().cyan(), title);
    println!("{}", "=".repeat(80));
}

fn format_author(author: &Author) -> String {
    format!("[{}] {}", author.id, style(&author.name).bold())
}

fn format_book(book: &Book) -> String {
    let mut line = format!(
        "[{}] {} (author {})",
        book.id,
        style(&book.title).bold(),
        book.author_id
    );
    if !book.description.is_empty() {
        line.push_str(&format!("\n    {}", truncate(&book.description, 70)));
    }
    line
}

fn format_copy(copy: &BookCopy) -> String {
    let state = match copy.state {
        CopyState::Available => style(copy.state.as_str()).green(),
        CopyState::OnLoan => style(copy.state.as_str()).yellow(),
        CopyState::Overdue => style(copy.state.as_str()).red(),
    };
    format!(
        "[{}] book {} | condition {} | {}",
        copy.id, copy.book_id, copy.condition, state
    )
}

fn format_member(member: &Member) -> String {
    format!(
        "[{}] {} | SSN {} | member since {}",
        member.id,
        style(&member.name).bold(),
        member.ssn,
        format_date(member.member_since)
    )
}

fn format_loan(loan: &Loan, now: Timestamp) -> String {
    let status = match loan.returned_at {
        Some(at) => format!("returned {}", format_date(at)),
        None if loan.is_overdue(now) => style("OVERDUE").red().bold().to_string(),
        None => "open".to_string(),
    };
    format!(
        "[{}] copy {} -> member {} | {} .. {} | {}",
        loan.id,
        loan.copy_id,
        loan.member_id,
        format_date(loan.loaned_at),
        format_date(loan.due_at),
        status
    )
}

fn format_date(ts: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(ts.as_millis())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
