//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable overriding `app.database_path`
pub const ENV_DATABASE_PATH: &str = "SHELFMARK_APP_DATABASE_PATH";
/// Environment variable overriding `app.log_level`
pub const ENV_LOG_LEVEL: &str = "SHELFMARK_APP_LOG_LEVEL";
/// Environment variable overriding `lending.loan_period_days`
pub const ENV_LOAN_PERIOD_DAYS: &str = "SHELFMARK_LENDING_LOAN_PERIOD_DAYS";
/// Environment variable overriding `lending.fee_per_day`
pub const ENV_FEE_PER_DAY: &str = "SHELFMARK_LENDING_FEE_PER_DAY";

/// Main configuration manager
///
/// Primary interface for loading, saving, and managing configuration. It
/// owns the file location and delegates I/O to `ConfigPersistence`.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/shelfmark/`
    /// - macOS: `~/Library/Application Support/shelfmark/`
    /// - Windows: `%APPDATA%\shelfmark\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "shelfmark")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    /// Returns the config directory path
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Loads the configuration from file
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Saves the configuration to file
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Loads the config file and applies `SHELFMARK_SECTION_FIELD` overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

/// Applies overrides read through `lookup`; unparsable values are errors
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DATABASE_PATH) {
        config.app.database_path = PathBuf::from(path);
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.app.log_level = parse_override(ENV_LOG_LEVEL, &level)?;
    }

    if let Some(days) = lookup(ENV_LOAN_PERIOD_DAYS) {
        config.lending.loan_period_days = parse_override(ENV_LOAN_PERIOD_DAYS, &days)?;
    }

    if let Some(fee) = lookup(ENV_FEE_PER_DAY) {
        config.lending.fee_per_day = parse_override(ENV_FEE_PER_DAY, &fee)?;
    }

    Ok(())
}

fn parse_override<T: FromStr>(variable: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvOverrideError {
            variable: variable.to_string(),
            value: value.to_string(),
        })
}
