//! Mapping of database errors into store errors.

use domain::StoreError;

/// Converts a sqlx error into a [`StoreError`].
///
/// Unique violations (`23505`) become `Conflict`, missing rows `NotFound`;
/// everything else is a backend failure.
pub fn into_store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict(db_err.message().to_string())
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            StoreError::Backend(err.to_string())
        }
    }
}

/// Error for a stored row that cannot be mapped into a domain model.
pub fn corrupt_row(table: &str, detail: impl std::fmt::Display) -> StoreError {
    tracing::error!(table = %table, detail = %detail, "Corrupt row");
    StoreError::Backend(format!("Corrupt row in {}: {}", table, detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            into_store_error(sqlx::Error::RowNotFound),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_pool_timeout_maps_to_backend() {
        assert!(matches!(
            into_store_error(sqlx::Error::PoolTimedOut),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn test_corrupt_row_message() {
        let err = corrupt_row("field_definitions", "unknown target type");
        assert_eq!(
            err.to_string(),
            "Storage backend error: Corrupt row in field_definitions: unknown target type"
        );
    }
}
