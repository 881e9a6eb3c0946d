//! Shelfmark Library Management
//!
//! Domain services over the database layer: authors, books, copies, members
//! and loans, with the lending rules and deletion guards that keep them
//! consistent. `LibraryManager` wires the services to one database.

pub mod error;
pub mod manager;
pub mod notify;
pub mod services;
pub mod wear;

pub use error::{FailureKind, LibraryError, LibraryResult};
pub use manager::{LibraryManager, LibraryStats};
pub use notify::{ChangeBus, ChangeListener, EntityKind, SubscriptionId};
pub use services::{
    AuthorService, BookService, CopyService, LendingPolicy, LoanService, MemberService,
    ReturnOutcome,
};
pub use wear::{FixedWear, RandomWear, WearModel};

use shelfmark_config::{Config, LendingConfig};

/// Library configuration
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Database file path
    pub database_path: String,
    /// Loan period, fees and wear
    pub lending: LendingConfig,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database_path: "shelfmark.db".to_string(),
            lending: LendingConfig::default(),
        }
    }
}

impl LibraryConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    pub fn with_lending(mut self, lending: LendingConfig) -> Self {
        self.lending = lending;
        self
    }
}

impl From<&Config> for LibraryConfig {
    fn from(config: &Config) -> Self {
        Self {
            database_path: config.app.database_path.to_string_lossy().into_owned(),
            lending: config.lending.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_default() {
        let config = LibraryConfig::default();
        assert_eq!(config.database_path, "shelfmark.db");
        assert_eq!(config.lending, LendingConfig::default());
    }

    #[test]
    fn test_config_builder() {
        let lending = LendingConfig {
            loan_period_days: 21,
            ..LendingConfig::default()
        };
        let config = LibraryConfig::new("custom.db").with_lending(lending);

        assert_eq!(config.database_path, "custom.db");
        assert_eq!(config.lending.loan_period_days, 21);
    }

    #[test]
    fn test_config_from_app_config() {
        let mut app = Config::default();
        app.app.database_path = PathBuf::from("/srv/branch.db");
        app.lending.fee_per_day = 5;

        let config = LibraryConfig::from(&app);
        assert_eq!(config.database_path, "/srv/branch.db");
        assert_eq!(config.lending.fee_per_day, 5);
    }
}
