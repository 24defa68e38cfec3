//! Actor database repository
//!
//! Actors are read-only from the API. They are populated by seeding
//! (see [`crate::db::seed`]) and looked up by id when resolving `Movie.actor`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::error::Result;
use super::sqlite_helpers::placeholders;

/// Actor record from database
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: String,
    pub name: String,
}

/// Lookup contract for actors referenced by movies.
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Actors whose id is in `ids`, in the order of `ids`.
    /// Unknown ids are simply absent from the result.
    async fn get_actors_by_ids(&self, ids: &[String]) -> Result<Vec<ActorRecord>>;
}

pub struct ActorRepository {
    pool: SqlitePool,
}

impl ActorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all actors
    pub async fn list_all(&self) -> Result<Vec<ActorRecord>> {
        let records = sqlx::query_as::<_, ActorRecord>(
            r#"
            SELECT id, name
            FROM actors
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Insert actors, leaving existing ids untouched. Returns rows inserted.
    pub async fn insert_missing(&self, actors: &[ActorRecord]) -> Result<u64> {
        if actors.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for actor in actors {
            let result = sqlx::query("INSERT OR IGNORE INTO actors (id, name) VALUES (?1, ?2)")
                .bind(&actor.id)
                .bind(&actor.name)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }
}

#[async_trait]
impl ActorStore for ActorRepository {
    async fn get_actors_by_ids(&self, ids: &[String]) -> Result<Vec<ActorRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name FROM actors WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, ActorRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let found = query.fetch_all(&self.pool).await?;

        // Reorder to match the caller's id order; ids may repeat
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|a| &a.id == id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn actor(id: &str, name: &str) -> ActorRecord {
        ActorRecord {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    async fn seeded() -> ActorRepository {
        let db = Database::connect_in_memory().await.unwrap();
        crate::db::schema_sync::sync_schema(db.pool()).await;
        let repo = db.actors();
        repo.insert_missing(&[
            actor("a1", "Timothée Chalamet"),
            actor("a2", "Zendaya"),
            actor("a3", "Rebecca Ferguson"),
        ])
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_lookup_follows_requested_order() {
        let repo = seeded().await;
        let found = repo
            .get_actors_by_ids(&["a3".into(), "a1".into()])
            .await
            .unwrap();
        assert_eq!(
            found,
            vec![actor("a3", "Rebecca Ferguson"), actor("a1", "Timothée Chalamet")]
        );
    }

    #[tokio::test]
    async fn test_unknown_ids_are_dropped() {
        let repo = seeded().await;
        let found = repo
            .get_actors_by_ids(&["ghost".into(), "a2".into()])
            .await
            .unwrap();
        assert_eq!(found, vec![actor("a2", "Zendaya")]);
    }

    #[tokio::test]
    async fn test_empty_ids_skip_query() {
        let repo = seeded().await;
        assert!(repo.get_actors_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_missing_is_idempotent() {
        let repo = seeded().await;
        let inserted = repo
            .insert_missing(&[actor("a1", "Someone Else"), actor("a4", "Javier Bardem")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.contains(&actor("a1", "Timothée Chalamet")));
    }
}
