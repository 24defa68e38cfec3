// Helper functions shared across GraphQL query/mutation modules.

use async_graphql::ErrorExtensions;

use crate::db::StoreError;

/// Log a storage failure and turn it into a `STORAGE_ERROR` GraphQL error.
/// `action` reads as "while <action>".
pub(crate) fn storage_error(action: &str, e: StoreError) -> async_graphql::Error {
    tracing::error!(error = %e, action, "Storage operation failed");
    async_graphql::Error::new(format!("Storage error while {}", action))
        .extend_with(|_, ext| ext.set("code", "STORAGE_ERROR"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    #[test]
    fn test_storage_error_carries_code() {
        let err = storage_error("listing movies", StoreError::Database(sqlx::Error::PoolClosed));
        assert_eq!(err.message, "Storage error while listing movies");
        let code = err.extensions.as_ref().and_then(|ext| ext.get("code")).cloned();
        assert_eq!(code, Some(Value::String("STORAGE_ERROR".to_string())));
    }
}
