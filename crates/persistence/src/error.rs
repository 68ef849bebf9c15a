//! Classification of database failures into the domain error taxonomy.

use domain::errors::DomainError;
use thiserror::Error;

/// SQLSTATE codes treated as transient: statement timeout, serialization
/// failure, deadlock, admin shutdown, and connection failures.
const TRANSIENT_CODES: &[&str] = &["57014", "40001", "40P01", "57P01", "08000", "08003", "08006"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("row not found")]
    RowNotFound,

    #[error("database error: {0}")]
    Other(#[source] sqlx::Error),
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn constraint(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.constraint().unwrap_or("unknown").to_string(),
        _ => "unknown".to_string(),
    }
}

/// Whether the failure is worth one more attempt for a read.
pub fn is_transient(err: &sqlx::Error) -> bool {
    if matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    ) {
        return true;
    }
    sqlstate(err).is_some_and(|code| TRANSIENT_CODES.contains(&code.as_str()))
}

/// Whether the failure is a unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint_name: &str) -> bool {
    sqlstate(err).as_deref() == Some("23505") && constraint(err) == constraint_name
}

/// Whether the failure is a check constraint violation on the named constraint.
pub fn is_check_violation(err: &sqlx::Error, constraint_name: &str) -> bool {
    sqlstate(err).as_deref() == Some("23514") && constraint(err) == constraint_name
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            return StoreError::Unavailable(err.to_string());
        }
        match sqlstate(&err).as_deref() {
            Some("23505") => StoreError::UniqueViolation(constraint(&err)),
            Some("23503") => StoreError::ForeignKeyViolation(constraint(&err)),
            Some("23514") => StoreError::CheckViolation(constraint(&err)),
            _ if matches!(err, sqlx::Error::RowNotFound) => StoreError::RowNotFound,
            _ => StoreError::Other(err),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(detail) => {
                tracing::warn!(error = %detail, "Database unavailable");
                DomainError::Unavailable("Database temporarily unavailable".into())
            }
            StoreError::UniqueViolation(_) => {
                DomainError::Conflict("Resource already exists".into())
            }
            StoreError::ForeignKeyViolation(_) => {
                DomainError::NotFound("Referenced resource not found".into())
            }
            StoreError::CheckViolation(_) => {
                DomainError::InvalidState("Operation violates a data constraint".into())
            }
            StoreError::RowNotFound => DomainError::NotFound("Resource not found".into()),
            StoreError::Other(e) => DomainError::Internal(e.to_string()),
        }
    }
}

/// Shorthand for `map_err` at the persistence boundary.
pub fn to_domain(err: sqlx::Error) -> DomainError {
    StoreError::from(err).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::errors::ErrorKind;

    #[test]
    fn test_pool_timeout_is_unavailable() {
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert_eq!(to_domain(sqlx::Error::PoolTimedOut).kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_io_error_is_unavailable() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert_eq!(to_domain(err).kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert_eq!(to_domain(sqlx::Error::RowNotFound).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_protocol_error_is_internal() {
        let err = sqlx::Error::Protocol("unexpected message".into());
        assert_eq!(to_domain(err).kind(), ErrorKind::Internal);
    }
}
