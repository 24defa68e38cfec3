//! Database service: wraps the SQLite pool for lifecycle (start/stop/health) and dependencies.
//!
//! Other services that need the database should declare `dependencies: ["database"]`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::db::schema_sync::sync_schema;
use crate::db::seed::run_seeds;
use crate::services::manager::{Service, ServiceHealth};

/// Configuration for the database service.
#[derive(Debug, Clone)]
pub struct DatabaseServiceConfig {
    /// SQLite connection URL (e.g. `sqlite:./data/movies.db` or `sqlite::memory:`).
    pub database_url: String,
    pub max_connections: u32,
    /// Optional JSON file of actors seeded on start
    pub actors_seed_path: Option<PathBuf>,
}

impl Default for DatabaseServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/movies.db".to_string(),
            max_connections: 10,
            actors_seed_path: None,
        }
    }
}

/// Service that owns the database pool and provides start/stop/health.
/// Register this first so that services depending on `"database"` can start after it.
pub struct DatabaseService {
    pool: Database,
    actors_seed_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Wrap an already-connected pool
    pub fn new(pool: Database) -> Self {
        Self {
            pool,
            actors_seed_path: None,
        }
    }

    /// Connect from config. There is no retry: a bad URL or unreachable file fails here.
    pub async fn from_config(config: DatabaseServiceConfig) -> Result<Self> {
        let pool = if config.database_url == "sqlite::memory:" {
            Database::connect_in_memory().await?
        } else {
            Database::connect(&config.database_url, config.max_connections).await?
        };
        info!(service = "database", url = %config.database_url, "Connected to database");
        Ok(Self {
            pool,
            actors_seed_path: config.actors_seed_path,
        })
    }

    /// Access the pool. Valid until [Service::stop] is called.
    pub fn pool(&self) -> &Database {
        &self.pool
    }
}

#[async_trait]
impl Service for DatabaseService {
    fn name(&self) -> &str {
        "database"
    }

    async fn start(&self) -> Result<()> {
        info!(service = "database", "Database service starting");
        self.pool.ping().await.context("Database did not answer SELECT 1")?;

        let sync_result = sync_schema(self.pool.pool()).await;
        if !sync_result.tables_created.is_empty() {
            info!(
                service = "database",
                tables = ?sync_result.tables_created,
                "Created tables"
            );
        }
        if !sync_result.columns_added.is_empty() {
            info!(
                service = "database",
                columns = ?sync_result.columns_added,
                "Added columns"
            );
        }
        if !sync_result.errors.is_empty() {
            for err in &sync_result.errors {
                error!(service = "database", error = %err, "Schema sync error");
            }
            anyhow::bail!("Schema sync failed: {}", sync_result.errors.join("; "));
        }

        let seed_result = run_seeds(&self.pool, self.actors_seed_path.as_deref()).await;
        for err in &seed_result.errors {
            warn!(service = "database", error = %err, "Seed error");
        }
        if !seed_result.tables_seeded.is_empty() {
            info!(
                service = "database",
                tables = ?seed_result.tables_seeded,
                "Pre-seed complete"
            );
        }

        info!(service = "database", "Database service started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.pool.close().await;
        info!(service = "database", "Database service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        match self.pool.ping().await {
            Ok(()) => Ok(ServiceHealth::healthy()),
            Err(e) => {
                warn!(service = "database", error = %e, "Health check failed");
                Ok(ServiceHealth::unhealthy(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::manager::HealthStatus;

    #[tokio::test]
    async fn test_start_creates_schema_and_stop_closes_pool() {
        let service = DatabaseService::from_config(DatabaseServiceConfig {
            database_url: "sqlite::memory:".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        service.start().await.unwrap();
        assert_eq!(service.pool().movies().count().await.unwrap(), 0);
        assert_eq!(service.health().await.unwrap().status, HealthStatus::Healthy);

        service.stop().await.unwrap();
        assert!(service.pool().is_closed());
        assert_eq!(service.health().await.unwrap().status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_start_fails_when_movies_table_cannot_be_created() {
        let db = Database::connect_in_memory().await.unwrap();
        // An index named `movies` makes CREATE TABLE movies fail
        sqlx::query("CREATE TABLE other (x INTEGER)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("CREATE INDEX movies ON other (x)")
            .execute(db.pool())
            .await
            .unwrap();

        let service = DatabaseService::new(db);
        let err = service.start().await.unwrap_err();
        assert!(err.to_string().contains("movies"), "{err:#}");
    }
}
