//! Database connection and repositories

pub mod actors;
pub mod error;
pub mod movies;
pub mod schema_sync;
pub mod seed;
pub mod sqlite_helpers;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use actors::{ActorRecord, ActorRepository, ActorStore};
pub use error::StoreError;
pub use movies::{CreateMovie, MovieRecord, MovieRepository, MovieStore};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a connection pool. The database file (and its directory) is
    /// created if it does not exist yet.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        if !url.starts_with("sqlite:") {
            anyhow::bail!("Unsupported database URL '{}': expected a sqlite: URL", url);
        }

        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true);

        let filename = options.get_filename();
        if let Some(dir) = filename.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Private in-memory database. Limited to one connection that is never
    /// recycled, since every SQLite memory connection is its own database.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Verify the pool can run a query
    pub async fn ping(&self) -> std::result::Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every connection. Further queries fail with `PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Get a movies repository
    pub fn movies(&self) -> MovieRepository {
        MovieRepository::new(self.pool.clone())
    }

    /// Get an actors repository
    pub fn actors(&self) -> ActorRepository {
        ActorRepository::new(self.pool.clone())
    }
}
