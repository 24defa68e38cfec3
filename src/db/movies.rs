//! Movie database repository
//!
//! Movies are stored one row per document. `actor_ids` is a JSON array and
//! `release_date` is epoch milliseconds; everything except `id` is nullable
//! because the stored document shape carries no required fields.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::error::{Result, StoreError};
use super::sqlite_helpers::{
    json_to_vec, millis_to_datetime, new_id, now_iso8601, str_to_datetime, vec_to_json,
};

/// Movie record from database
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub id: String,
    pub title: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub rating: Option<i32>,
    /// Wire name of the status (`WATCHED`, `INTERESTED`, ...)
    pub status: Option<String>,
    pub actor_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for MovieRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let release_millis: Option<i64> = row.try_get("release_date")?;
        let actor_ids_json: Option<String> = row.try_get("actor_ids")?;
        let created_str: String = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            release_date: millis_to_datetime("release_date", release_millis)
                .map_err(|e| e.into_sqlx())?,
            rating: row.try_get("rating")?,
            status: row.try_get("status")?,
            actor_ids: json_to_vec("actor_ids", actor_ids_json.as_deref().unwrap_or_default())
                .map_err(|e| e.into_sqlx())?,
            created_at: str_to_datetime("created_at", &created_str).map_err(|e| e.into_sqlx())?,
        })
    }
}

/// Input for creating a movie. Storage assigns the id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateMovie {
    pub title: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub rating: Option<i32>,
    pub status: Option<String>,
    pub actor_ids: Vec<String>,
}

/// Persistence contract for movies, used by the GraphQL resolvers.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// All movies in storage-native (insertion) order
    async fn list_movies(&self) -> Result<Vec<MovieRecord>>;

    /// A single movie; `Ok(None)` when no movie has this id
    async fn get_movie(&self, id: &str) -> Result<Option<MovieRecord>>;

    /// Persist a new movie and return it with its generated id
    async fn create_movie(&self, input: CreateMovie) -> Result<MovieRecord>;
}

pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of stored movies
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl MovieStore for MovieRepository {
    async fn list_movies(&self) -> Result<Vec<MovieRecord>> {
        let records = sqlx::query_as::<_, MovieRecord>(
            r#"
            SELECT id, title, release_date, rating, status, actor_ids, created_at
            FROM movies
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get_movie(&self, id: &str) -> Result<Option<MovieRecord>> {
        let record = sqlx::query_as::<_, MovieRecord>(
            r#"
            SELECT id, title, release_date, rating, status, actor_ids, created_at
            FROM movies
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn create_movie(&self, input: CreateMovie) -> Result<MovieRecord> {
        let id = new_id();
        let created_at = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO movies (id, title, release_date, rating, status, actor_ids, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(&input.title)
        .bind(input.release_date.map(|d| d.timestamp_millis()))
        .bind(input.rating)
        .bind(&input.status)
        .bind(vec_to_json(&input.actor_ids))
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        // Read back so the caller sees exactly what storage holds
        self.get_movie(&id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }
}
