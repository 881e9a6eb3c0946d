//! Shelfmark Configuration System
//!
//! Settings are grouped into sections, each implementing `ConfigSection`:
//!
//! - `app`: where the library database lives and how verbose logging is
//! - `lending`: loan period, late fee rate and copy wear
//!
//! Files are TOML, written atomically with a `.backup` of the previous
//! version. Invalid values found on load are reported as warnings so a bad
//! edit never locks the user out; invalid values are refused on save.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelfmark_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Loan period: {} days", config.lending.loan_period_days);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
pub mod lending_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{
    apply_env_overrides, ConfigManager, ENV_DATABASE_PATH, ENV_FEE_PER_DAY, ENV_LOAN_PERIOD_DAYS,
    ENV_LOG_LEVEL,
};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use lending_config::LendingConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Lending rules
    pub lending: LendingConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.lending.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    ///
    /// Used for override chains: defaults < file < env vars < CLI args
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.lending.merge(other.lending);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            lending: LendingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_version_is_set() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut override_config = Config::default();
        override_config.lending.fee_per_day = 25;

        base.merge(override_config);
        assert_eq!(base.lending.fee_per_day, 25);
    }

    #[test]
    fn test_errors_collected_across_sections() {
        let mut config = Config::default();
        config.app.database_path = std::path::PathBuf::new();
        config.lending.loan_period_days = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[lending]\nfee_per_day = 3\n").unwrap();
        assert_eq!(config.lending.fee_per_day, 3);
        assert_eq!(config.lending.loan_period_days, 15);
        assert_eq!(config.app, AppConfig::default());
    }
}
