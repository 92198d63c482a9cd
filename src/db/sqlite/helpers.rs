//! Shared helper functions for SQLite repositories.

use sqlx::sqlite::SqliteQueryResult;

use crate::db::DbError;

/// Map a sqlx error onto the storage-agnostic error type.
///
/// Unique and foreign key violations become `Constraint` so callers can
/// turn them into client errors.
pub fn database_error(e: sqlx::Error) -> DbError {
    if let Some(db_err) = e.as_database_error()
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return DbError::Constraint {
            message: db_err.message().to_string(),
        };
    }

    DbError::Database {
        message: e.to_string(),
    }
}

/// Turn a zero-row UPDATE/DELETE into `NotFound`.
pub fn expect_affected(
    result: SqliteQueryResult,
    entity_type: &str,
    id: impl ToString,
) -> Result<(), DbError> {
    if result.rows_affected() == 0 {
        return Err(DbError::not_found(entity_type, id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_become_database_variant() {
        let err = database_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Database { .. }));
    }
}
