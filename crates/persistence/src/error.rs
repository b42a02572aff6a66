//! Mapping of database errors onto store errors.

use domain::store::StoreError;

/// PostgreSQL unique_violation.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL check_violation.
const CHECK_VIOLATION: &str = "23514";

/// Convert a sqlx error raised while operating on `what`.
pub fn map_sqlx_error(err: sqlx::Error, what: &str) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(what.to_string()),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => StoreError::Conflict(what.to_string()),
            Some(CHECK_VIOLATION) => {
                StoreError::Corrupted(format!("{}: {}", what, db_err.message()))
            }
            _ => StoreError::Unavailable(format!("Database error: {}", db_err)),
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupted(format!("{}: {}", what, err))
        }
        _ => StoreError::Unavailable(format!("Database error: {}", err)),
    }
}
