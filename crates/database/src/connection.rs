//! Database connection management

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use shelfmark_core::AppError;

/// Database connection pool
pub type DbPool = Pool<Sqlite>;

/// Path that selects a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable Write-Ahead Logging (WAL) mode
    pub enable_wal: bool,
    /// Create database if it doesn't exist
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "shelfmark.db".to_string(),
            max_connections: 1,
            enable_wal: true,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// Creates a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Configuration for a throwaway in-memory database
    ///
    /// Every connection to `:memory:` opens a distinct database, so the pool
    /// is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY.to_string(),
            max_connections: 1,
            enable_wal: false,
            create_if_missing: true,
        }
    }

    /// Returns true if this configuration targets an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }
}

/// Establishes a connection pool to the database
pub async fn connect(config: DatabaseConfig) -> Result<DbPool, AppError> {
    let mut options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))
        .map_err(|e| AppError::database("Invalid database path", e))?
        .create_if_missing(config.create_if_missing)
        .foreign_keys(true);

    if config.enable_wal && !config.is_in_memory() {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    } else if config.is_in_memory() {
        options = options.journal_mode(SqliteJournalMode::Memory);
    }

    let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);

    // Dropping the last connection would discard an in-memory database
    if config.is_in_memory() {
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to database", e))?;

    log::debug!("Connected to database at {}", config.path);
    Ok(pool)
}

/// Creates an in-memory database for testing
#[cfg(test)]
pub async fn create_test_db() -> Result<DbPool, AppError> {
    connect(DatabaseConfig::in_memory()).await
}

/// Closes the database connection pool
pub async fn close(pool: DbPool) {
    pool.close().await;
}

/// Checks if the database file exists
pub fn database_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_connect_creates_database() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let pool = connect(DatabaseConfig::new(path.clone())).await.unwrap();

        assert!(database_exists(&path));
        close(pool).await;
    }

    #[tokio::test]
    async fn test_connect_with_wal_mode() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let pool = connect(DatabaseConfig::new(path))
            .await
            .unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode;")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
        close(pool).await;
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_db().await.unwrap();

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys;")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(result.0, 1);
        close(pool).await;
    }

    #[test]
    fn test_config_new() {
        let config = DatabaseConfig::new("test.db");

        assert_eq!(config.path, "test.db");
        assert_eq!(config.max_connections, 1);
        assert!(config.enable_wal);
        assert!(config.create_if_missing);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_config_default() {
        let config = DatabaseConfig::default();

        assert_eq!(config.path, "shelfmark.db");
        assert_eq!(config.max_connections, 1);
        assert!(config.enable_wal);
        assert!(config.create_if_missing);
    }

    #[tokio::test]
    async fn test_in_memory_survives_between_queries() {
        let pool = create_test_db().await.unwrap();

        sqlx::query("CREATE TABLE scratch (v INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO scratch (v) VALUES (7)")
            .execute(&pool)
            .await
            .unwrap();

        let v: i64 = sqlx::query_scalar("SELECT v FROM scratch")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn test_database_exists() {
        let temp_file = NamedTempFile::new().unwrap();

        assert!(database_exists(temp_file.path()));
        assert!(!database_exists("/nonexistent/path/to/db.sqlite"));
    }
}
