//! Automatic schema synchronization from table definitions
//!
//! - Creates missing tables
//! - Adds columns that a table definition gained since the database was created
//! - Does NOT handle column renames or type changes

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Column definition used to create or extend a table
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<&'static str>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            primary_key: false,
            default: None,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    const fn not_null(mut self, default: &'static str) -> Self {
        self.nullable = false;
        self.default = Some(default);
        self
    }
}

/// Table definition
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// CREATE TABLE statement for this definition
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(column_sql).collect();
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, columns.join(", "))
    }
}

pub const MOVIES_TABLE: TableDef = TableDef {
    name: "movies",
    columns: &[
        ColumnDef::new("id", "TEXT").primary_key(),
        ColumnDef::new("title", "TEXT"),
        ColumnDef::new("release_date", "INTEGER"),
        ColumnDef::new("rating", "INTEGER"),
        ColumnDef::new("status", "TEXT"),
        ColumnDef::new("actor_ids", "TEXT").not_null("'[]'"),
        ColumnDef::new("created_at", "TEXT").not_null("(datetime('now'))"),
    ],
};

pub const ACTORS_TABLE: TableDef = TableDef {
    name: "actors",
    columns: &[
        ColumnDef::new("id", "TEXT").primary_key(),
        ColumnDef::new("name", "TEXT").not_null("''"),
    ],
};

/// Every table owned by this service
pub const ALL_TABLES: &[TableDef] = &[MOVIES_TABLE, ACTORS_TABLE];

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub columns_added: Vec<(String, String)>, // (table, column)
    pub errors: Vec<String>,
}

impl SchemaSyncResult {
    fn merge(&mut self, other: SchemaSyncResult) {
        self.tables_created.extend(other.tables_created);
        self.columns_added.extend(other.columns_added);
        self.errors.extend(other.errors);
    }
}

fn column_sql(col: &ColumnDef) -> String {
    let mut sql = format!("{} {}", col.name, col.sql_type);
    if col.primary_key {
        sql.push_str(" PRIMARY KEY");
    } else if !col.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = col.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    sql
}

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Get existing columns for a table
async fn get_table_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(i32, String, String, i32, Option<String>, i32)> =
        sqlx::query_as(&format!("PRAGMA table_info({})", table_name))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(_, name, _, _, _, _)| name).collect())
}

/// Generate ALTER TABLE ADD COLUMN SQL.
///
/// SQLite cannot add PRIMARY KEY columns, and NOT NULL columns need a default.
fn generate_add_column_sql(table_name: &str, col: &ColumnDef) -> String {
    let mut sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table_name, col.name, col.sql_type);
    if !col.nullable {
        sql.push_str(" NOT NULL");
    }
    match (col.default, col.nullable) {
        // Expression defaults are not allowed by ALTER TABLE
        (Some(default), _) if !default.starts_with('(') => {
            sql.push_str(&format!(" DEFAULT {}", default))
        }
        (_, false) => sql.push_str(match col.sql_type {
            "INTEGER" => " DEFAULT 0",
            "REAL" => " DEFAULT 0.0",
            _ => " DEFAULT ''",
        }),
        _ => {}
    }
    sql
}

/// Sync a single table definition to the database
pub async fn sync_table(pool: &SqlitePool, table: &TableDef) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    if !table_exists(pool, table.name).await? {
        let create_sql = table.create_table_sql();
        debug!("Creating table {}: {}", table.name, create_sql);

        match sqlx::query(&create_sql).execute(pool).await {
            Ok(_) => {
                info!("Created table: {}", table.name);
                result.tables_created.push(table.name.to_string());
            }
            Err(e) => {
                let msg = format!("Failed to create table {}: {}", table.name, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
        return Ok(result);
    }

    let existing_columns = get_table_columns(pool, table.name).await?;
    for col in table.columns {
        if existing_columns.iter().any(|c| c == col.name) {
            continue;
        }
        let alter_sql = generate_add_column_sql(table.name, col);
        debug!("Adding column to {}: {}", table.name, alter_sql);

        match sqlx::query(&alter_sql).execute(pool).await {
            Ok(_) => {
                info!("Added column {}.{}", table.name, col.name);
                result
                    .columns_added
                    .push((table.name.to_string(), col.name.to_string()));
            }
            Err(e) => {
                let msg = format!("Failed to add column {}.{}: {}", table.name, col.name, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    Ok(result)
}

/// Sync every table this service owns. Errors are collected, not returned.
pub async fn sync_schema(pool: &SqlitePool) -> SchemaSyncResult {
    let mut result = SchemaSyncResult::default();
    for table in ALL_TABLES {
        match sync_table(pool, table).await {
            Ok(r) => result.merge(r),
            Err(e) => result
                .errors
                .push(format!("Failed to inspect table {}: {}", table.name, e)),
        }
    }
    result
}
