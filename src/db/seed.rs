//! Pre-seed data for initial database setup.
//!
//! Runs after schema sync. Actors have no API write path, so the only way to
//! populate them is a JSON seed file:
//!
//! ```json
//! [{ "id": "a1", "name": "Timothée Chalamet" }]
//! ```
//!
//! Uses INSERT OR IGNORE so re-runs are idempotent (existing rows are preserved).

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::Database;
use super::actors::ActorRecord;

/// Result of running seed operations.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub tables_seeded: Vec<String>,
    pub errors: Vec<String>,
}

/// Read an actor seed file
pub fn load_actor_seed(path: &Path) -> Result<Vec<ActorRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read actor seed file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid actor seed file {}", path.display()))
}

async fn seed_actors(db: &Database, path: &Path) -> Result<u64> {
    let actors = load_actor_seed(path)?;
    debug!(count = actors.len(), path = %path.display(), "Loaded actor seed");
    let inserted = db.actors().insert_missing(&actors).await?;
    Ok(inserted)
}

/// Run all seeds. Errors are collected so a bad seed file never blocks startup.
pub async fn run_seeds(db: &Database, actors_seed_path: Option<&Path>) -> SeedResult {
    let mut result = SeedResult::default();

    if let Some(path) = actors_seed_path {
        match seed_actors(db, path).await {
            Ok(inserted) => {
                info!(inserted, "Seeded actors");
                result.tables_seeded.push("actors".to_string());
            }
            Err(e) => {
                let msg = format!("{:#}", e);
                warn!(error = %msg, "Actor seed failed");
                result.errors.push(msg);
            }
        }
    }

    result
}
