// FILE: crates/library/src/manager.rs

use crate::error::Result;
use crate::notify::ChangeBus;
use crate::services::{
    AuthorService, BookService, CopyService, LendingPolicy, LoanService, MemberService,
};
use crate::wear::{RandomWear, WearModel};
pub use crate::LibraryConfig;
use log::info;
use shelfmark_core::{CopyState, Timestamp};
use shelfmark_database::{
    connection::{self, connect, database_exists, DatabaseConfig},
    migrations::{applied_version, optimize, run_migrations, verify_integrity},
    DbPool, Repositories,
};
use std::sync::Arc;

/// High-level library management
///
/// Owns the database pool and hands out the services built on it. All
/// services share one `ChangeBus`, so a listener on any kind sees changes
/// made through any service.
pub struct LibraryManager {
    pool: DbPool,
    config: LibraryConfig,
    bus: ChangeBus,
    authors: AuthorService,
    books: BookService,
    copies: CopyService,
    members: MemberService,
    loans: LoanService,
}

impl LibraryManager {
    /// Create a new library manager
    pub async fn new(config: LibraryConfig) -> Result<Self> {
        let wear = Arc::new(RandomWear::new(config.lending.max_wear));
        Self::with_wear(config, wear).await
    }

    /// Create a library manager with a custom wear model
    pub async fn with_wear(config: LibraryConfig, wear: Arc<dyn WearModel>) -> Result<Self> {
        info!(
            "Initializing library with database: {}",
            config.database_path
        );

        let policy = LendingPolicy::try_from(&config.lending)?;

        if !database_exists(&config.database_path) {
            info!("Creating new library database");
        }

        let pool = connect(DatabaseConfig::new(&config.database_path)).await?;
        run_migrations(&pool).await?;

        let repos = Repositories::new(pool.clone());
        let bus = ChangeBus::new();

        Ok(Self {
            authors: AuthorService::new(repos.clone(), bus.clone()),
            books: BookService::new(repos.clone(), bus.clone()),
            copies: CopyService::new(repos.clone(), bus.clone()),
            members: MemberService::new(repos.clone(), bus.clone()),
            loans: LoanService::with_wear(repos, bus.clone(), policy, wear),
            pool,
            config,
            bus,
        })
    }

    pub fn authors(&self) -> &AuthorService {
        &self.authors
    }

    pub fn books(&self) -> &BookService {
        &self.books
    }

    pub fn copies(&self) -> &CopyService {
        &self.copies
    }

    pub fn members(&self) -> &MemberService {
        &self.members
    }

    pub fn loans(&self) -> &LoanService {
        &self.loans
    }

    /// Shared change notification bus
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Get library statistics as of `now`
    pub async fn stats(&self, now: Timestamp) -> Result<LibraryStats> {
        let copies = self.copies.all().await?;
        let loans = self.loans.all().await?;

        Ok(LibraryStats {
            authors: self.authors.all().await?.len(),
            books: self.books.all().await?.len(),
            copies: copies.len(),
            available_copies: copies
                .iter()
                .filter(|c| c.state == CopyState::Available)
                .count(),
            members: self.members.all().await?.len(),
            open_loans: loans.iter().filter(|l| l.is_open()).count(),
            overdue_loans: loans.iter().filter(|l| l.is_overdue(now)).count(),
        })
    }

    /// Runs SQLite's integrity check and returns the applied schema version
    pub async fn verify(&self) -> Result<i64> {
        verify_integrity(&self.pool).await?;
        Ok(applied_version(&self.pool).await?)
    }

    /// Get database pool for advanced operations
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Closes the database pool, refreshing the query planner statistics first
    pub async fn close(self) {
        if let Err(e) = optimize(&self.pool).await {
            log::warn!("Skipping database optimize: {}", e);
        }
        connection::close(self.pool).await;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub authors: usize,
    pub books: usize,
    pub copies: usize,
    pub available_copies: usize,
    pub members: usize,
    pub open_loans: usize,
    /// Open loans past their due date, whether or not the sweep has run
    pub overdue_loans: usize,
}
