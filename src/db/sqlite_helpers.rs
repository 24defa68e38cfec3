//! SQLite helper utilities for type conversion
//!
//! SQLite has no native UUID, array, or timestamp types. Movie documents are
//! flattened into TEXT/INTEGER columns with the helpers below.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::StoreError;

// ============================================================================
// Identifier Helpers
// ============================================================================

/// Generate a fresh storage identifier
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Array/Vec Helpers (stored as JSON strings in SQLite)
// ============================================================================

/// Serialize a slice to a JSON string for SQLite storage
#[inline]
pub fn vec_to_json<T: Serialize>(v: &[T]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a JSON array column, reporting which column was malformed
pub fn json_to_vec<T: DeserializeOwned>(column: &'static str, s: &str) -> Result<Vec<T>, StoreError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(s).map_err(|e| StoreError::Decode {
        column,
        message: e.to_string(),
    })
}

// ============================================================================
// Timestamp Helpers
// ============================================================================

/// Current UTC timestamp as RFC 3339 text
#[inline]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Parse RFC 3339 text, falling back to SQLite's `datetime()` format
pub fn str_to_datetime(column: &'static str, s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| StoreError::Decode {
            column,
            message: format!("invalid datetime '{}': {}", s, e),
        })
}

/// Epoch milliseconds column to a UTC instant
pub fn millis_to_datetime(
    column: &'static str,
    millis: Option<i64>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    match millis {
        Some(ms) => DateTime::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| StoreError::Decode {
                column,
                message: format!("epoch milliseconds out of range: {}", ms),
            }),
        None => Ok(None),
    }
}

// ============================================================================
// Query Building Helpers
// ============================================================================

/// `?, ?, ?` for an IN clause with `count` bound values
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
