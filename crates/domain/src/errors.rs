//! Error taxonomy shared by every layer.

use serde::Serialize;
use thiserror::Error;

/// Stable, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    InvalidState,
    InvalidInput,
    Conflict,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::InvalidState(_) => ErrorKind::InvalidState,
            DomainError::InvalidInput(_) => ErrorKind::InvalidInput,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Unavailable(_) => ErrorKind::Unavailable,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The human-readable part, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            DomainError::Unauthenticated(m)
            | DomainError::Forbidden(m)
            | DomainError::NotFound(m)
            | DomainError::InvalidState(m)
            | DomainError::InvalidInput(m)
            | DomainError::Conflict(m)
            | DomainError::Unavailable(m)
            | DomainError::Internal(m) => m,
        }
    }

    /// Transient failures that a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Unavailable(_))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        DomainError::InvalidInput(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = DomainError::InvalidState("User is already suspended".into());
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.message(), "User is already suspended");
        assert_eq!(err.to_string(), "Invalid state: User is already suspended");
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(DomainError::Unavailable("pool timed out".into()).is_retryable());
        assert!(!DomainError::Internal("boom".into()).is_retryable());
        assert!(!DomainError::Conflict("dup".into()).is_retryable());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::InvalidInput).unwrap(),
            "\"invalid_input\""
        );
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
