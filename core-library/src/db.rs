//! # Catalogue Database
//!
//! Provides SQLite connection pooling for the catalogue, plus the fixture set
//! used by tests.
//!
//! Connections run in WAL mode with foreign keys enforced. Migrations from
//! `migrations/` are applied on pool creation, followed by a health check.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_library::db::{DatabaseConfig, create_pool};
//!
//! let config = DatabaseConfig::from_url("sqlite:warbler.db");
//! let pool = create_pool(config).await?;
//!
//! let libraries = SqliteEntityRepository::<Library>::new(pool);
//! let music = libraries.find_by_id(1).await?;
//! ```
//!
//! ## Testing
//!
//! Tests use an in-memory database seeded with the fixture set:
//!
//! ```rust,ignore
//! let pool = create_test_pool().await?;
//! load_fixtures(&pool).await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pool tuning for the catalogue database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:` URL, or `sqlite::memory:`
    pub database_url: String,

    pub min_connections: u32,

    pub max_connections: u32,

    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,

    /// Connections older than this are recycled
    pub max_lifetime: Option<Duration>,

    /// Connections idle longer than this are closed
    pub idle_timeout: Option<Duration>,

    /// Prepared statements cached per connection
    pub statement_cache_capacity: usize,
}

impl DatabaseConfig {
    /// Configuration for a database file at `database_path`
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let config = DatabaseConfig::new("warbler.db");
    /// ```
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        Self::from_url(format!("sqlite:{}", path.display()))
    }

    /// Configuration for a full `sqlite:` URL
    pub fn from_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(30 * 60)),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            statement_cache_capacity: 100,
        }
    }

    /// In-memory database for tests
    ///
    /// Each connection to `sqlite::memory:` sees its own database, so the
    /// pool holds exactly one connection and never recycles it.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            max_lifetime: None,
            idle_timeout: None,
            ..Self::from_url("sqlite::memory:")
        }
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Open the catalogue database, migrate it and verify it answers
///
/// # Errors
///
/// Returns an error if the URL is invalid, no connection can be opened, a
/// migration fails or the health check query fails.
///
/// # Examples
///
/// ```rust,ignore
/// let config = DatabaseConfig::new("warbler.db").max_connections(10);
/// let pool = create_pool(config).await?;
/// ```
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Opening catalogue database"
    );

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        .statement_cache_capacity(config.statement_cache_capacity);

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open connection pool");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    info!(connections = pool.size(), "Catalogue database ready");
    Ok(pool)
}

/// Migrated in-memory pool for tests
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

/// Load the fixed catalogue fixture set
///
/// Intended for tests against a freshly migrated database. Ids are explicit,
/// so the next key the store assigns in each table is one past the fixtures.
///
/// # Examples
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_something() {
///     let pool = create_test_pool().await.unwrap();
///     load_fixtures(&pool).await.unwrap();
///     // genre 1 is now "Jazz"
/// }
/// ```
pub async fn load_fixtures(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Loading catalogue fixtures");

    sqlx::raw_sql(include_str!("../fixtures/catalogue.sql"))
        .execute(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to load fixtures");
            LibraryError::Database(e)
        })?;

    Ok(())
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Applying migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    Ok(())
}

async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    debug!("Database health check passed");
    Ok(())
}
