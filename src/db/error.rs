//! Storage error type shared by all repositories

use thiserror::Error;

/// Failure talking to, or decoding from, the backing store.
///
/// "Not found" is never an error; lookups return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to decode column '{column}': {message}")]
    Decode {
        column: &'static str,
        message: String,
    },
}

impl StoreError {
    /// Convert into a `sqlx::Error` for use inside `FromRow` impls
    pub fn into_sqlx(self) -> sqlx::Error {
        match self {
            StoreError::Database(e) => e,
            other => sqlx::Error::Decode(Box::new(other)),
        }
    }
}

/// Result alias for repository operations
pub type Result<T> = std::result::Result<T, StoreError>;
