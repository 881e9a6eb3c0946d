// FILE: crates/library/tests/lending_tests.rs

use shelfmark_core::{
    CopyState, NewAuthor, NewBook, NewBookCopy, NewMember, SortOrder, Timestamp, DAY_MILLIS,
};
use shelfmark_library::{
    EntityKind, FailureKind, FixedWear, LibraryConfig, LibraryError, LibraryManager,
};
use shelfmark_config::ConfigManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

async fn setup(wear: i32) -> Result<(LibraryManager, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().into_owned();
    let manager =
        LibraryManager::with_wear(LibraryConfig::new(db_path), Arc::new(FixedWear(wear))).await?;
    Ok((manager, temp_file))
}

fn day(n: i64) -> Timestamp {
    Timestamp::from_millis(n * DAY_MILLIS)
}

#[tokio::test]
async fn test_orwell_scenario() -> Result<()> {
    let (library, _temp) = setup(2).await?;

    let author = library.authors().add(NewAuthor::new("A. Orwell")).await?;
    let book = library.books().add(NewBook::new(author.id, "1984")).await?;
    let copy = library.copies().add(NewBookCopy::new(book.id, 10)).await?;
    let member = library.members().add(NewMember::new("Eric", "123")).await?;
    assert_eq!(copy.state, CopyState::Available);

    let start = day(100);
    let loan = library.loans().create_loan_at(copy.id, member.id, start).await?;
    assert_eq!(loan.due_at.as_millis() - start.as_millis(), 15 * DAY_MILLIS);

    let err = library.books().remove(book.id).await.unwrap_err();
    assert!(matches!(err, LibraryError::CopiesInUse { .. }));
    assert_eq!(err.kind(), FailureKind::Conflict);
    assert!(library.books().find(book.id).await?.is_some());
    assert_eq!(library.copies().all().await?.len(), 1);
    assert_eq!(library.loans().all().await?.len(), 1);

    let outcome = library.loans().return_loan_at(loan.id, day(101)).await?;
    assert_eq!(outcome.copy.condition, 8);
    assert!(outcome.notice.is_none());

    library.books().remove(book.id).await?;
    assert!(library.books().all().await?.is_empty());
    assert!(library.copies().all().await?.is_empty());
    assert!(library.loans().all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_ssn() -> Result<()> {
    let (library, _temp) = setup(0).await?;

    library.members().add(NewMember::new("Eric", "555")).await?;
    let err = library
        .members()
        .add(NewMember::new("Sonia", "555"))
        .await
        .unwrap_err();

    assert!(matches!(err, LibraryError::AlreadyExists { .. }));
    assert_eq!(err.kind(), FailureKind::Validation);
    Ok(())
}

#[tokio::test]
async fn test_author_with_empty_name() -> Result<()> {
    let (library, _temp) = setup(0).await?;

    let err = library.authors().add(NewAuthor::new("")).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(library.authors().all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_late_return_fee() -> Result<()> {
    let (library, _temp) = setup(1).await?;

    let author = library.authors().add(NewAuthor::new("A. Orwell")).await?;
    let book = library.books().add(NewBook::new(author.id, "1984")).await?;
    let copy = library.copies().add(NewBookCopy::new(book.id, 1)).await?;
    let member = library.members().add(NewMember::new("Eric", "123")).await?;

    let loan = library.loans().create_loan_at(copy.id, member.id, day(0)).await?;
    let outcome = library.loans().return_loan_at(loan.id, day(19)).await?;

    let notice = outcome.notice.ok_or("expected an overdue notice")?;
    assert_eq!(notice.days_late, 4);
    assert_eq!(notice.fee, 40);
    assert_eq!(outcome.copy.condition, 0);

    let second = library.loans().return_loan_at(loan.id, day(20)).await;
    assert!(matches!(second, Err(LibraryError::LoanAlreadyReturned { .. })));
    Ok(())
}

#[tokio::test]
async fn test_member_with_open_loan_cannot_leave() -> Result<()> {
    let (library, _temp) = setup(0).await?;

    let author = library.authors().add(NewAuthor::new("A. Orwell")).await?;
    let book = library.books().add(NewBook::new(author.id, "1984")).await?;
    let copy = library.copies().add(NewBookCopy::new(book.id, 10)).await?;
    let member = library.members().add(NewMember::new("Eric", "123")).await?;
    let loan = library.loans().create_loan_at(copy.id, member.id, day(0)).await?;

    let err = library.members().remove(member.id).await.unwrap_err();
    assert!(matches!(err, LibraryError::MemberHasOpenLoans { open: 1, .. }));
    let held = library.members().copies_on_loan(member.id).await?;
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].id, copy.id);
    assert_eq!(held[0].state, CopyState::OnLoan);

    library.loans().return_loan_at(loan.id, day(1)).await?;
    library.members().remove(member.id).await?;
    assert!(library.loans().all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sweep_and_stats() -> Result<()> {
    let (library, _temp) = setup(0).await?;

    let author = library.authors().add(NewAuthor::new("A. Orwell")).await?;
    let book = library.books().add(NewBook::new(author.id, "1984")).await?;
    let early = library.copies().add(NewBookCopy::new(book.id, 10)).await?;
    let late = library.copies().add(NewBookCopy::new(book.id, 10)).await?;
    let member = library.members().add(NewMember::new("Eric", "123")).await?;

    library.loans().create_loan_at(early.id, member.id, day(0)).await?;
    library.loans().create_loan_at(late.id, member.id, day(10)).await?;

    assert_eq!(library.loans().mark_overdue(day(20)).await?, 1);

    let states: Vec<CopyState> = library
        .copies()
        .sorted("id", SortOrder::Ascending)
        .await?
        .into_iter()
        .map(|c| c.state)
        .collect();
    assert_eq!(states, vec![CopyState::Overdue, CopyState::OnLoan]);

    let stats = library.stats(day(20)).await?;
    assert_eq!(stats.open_loans, 2);
    assert_eq!(stats.overdue_loans, 1);
    assert_eq!(stats.available_copies, 0);
    Ok(())
}

#[tokio::test]
async fn test_sort_by_unknown_field() -> Result<()> {
    let (library, _temp) = setup(0).await?;

    let err = library
        .members()
        .sorted("name", SortOrder::Ascending)
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::Validation { ref field, .. } if field == "sort"));
    Ok(())
}

#[tokio::test]
async fn test_notifications_once_per_mutation() -> Result<()> {
    let (library, _temp) = setup(0).await?;

    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    let id = library.authors().subscribe(Arc::new(move |kind| {
        assert_eq!(kind, EntityKind::Author);
        handle.fetch_add(1, Ordering::SeqCst);
    }));

    let author = library.authors().add(NewAuthor::new("A. Orwell")).await?;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(library.authors().add(NewAuthor::new(" ")).await.is_err());
    assert_eq!(count.load(Ordering::SeqCst), 1);

    library.authors().remove(author.id).await?;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    assert!(library.authors().unsubscribe(id));
    library.authors().add(NewAuthor::new("E. Blair")).await?;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(library.bus().version(EntityKind::Author), 3);
    Ok(())
}

#[tokio::test]
async fn test_hand_edited_lending_config_is_refused() -> Result<()> {
    let config_dir = TempDir::new()?;
    std::fs::write(
        config_dir.path().join("config.toml"),
        "version = 1\n[lending]\nloan_period_days = 0\nfee_per_day = -10\n",
    )?;

    let mut config = ConfigManager::with_directory(config_dir.path().to_path_buf())?.load()?;
    config.app.database_path = config_dir.path().join("library.db");

    let err = LibraryManager::new(LibraryConfig::from(&config)).await.err();
    let err = err.ok_or("expected the lending settings to be refused")?;
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(err.to_string().contains("lending.fee_per_day"));
    assert!(!config_dir.path().join("library.db").exists());
    Ok(())
}
