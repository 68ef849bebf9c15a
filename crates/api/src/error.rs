use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, ErrorKind};
use persistence::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
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

    /// Request body failed field validation.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl ApiError {
    /// Stable machine-readable kind, shared with the domain taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => ErrorKind::Unauthenticated.as_str(),
            ApiError::Forbidden(_) => ErrorKind::Forbidden.as_str(),
            ApiError::NotFound(_) => ErrorKind::NotFound.as_str(),
            ApiError::InvalidState(_) => ErrorKind::InvalidState.as_str(),
            ApiError::InvalidInput(_) | ApiError::Validation { .. } => {
                ErrorKind::InvalidInput.as_str()
            }
            ApiError::Conflict(_) => ErrorKind::Conflict.as_str(),
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Unavailable(_) => ErrorKind::Unavailable.as_str(),
            ApiError::Internal(_) => ErrorKind::Internal.as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) | ApiError::InvalidInput(_) | ApiError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let mut retry_after = None;

        let (message, details) = match self {
            ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::InvalidState(msg)
            | ApiError::InvalidInput(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unavailable(msg) => (msg, None),
            ApiError::Validation { message, details } => (message, Some(details)),
            ApiError::RateLimited { retry_after_secs } => {
                retry_after = Some(retry_after_secs);
                ("Too many requests. Please try again later.".to_string(), None)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                kind,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Unauthenticated(msg) => ApiError::Unauthenticated(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::InvalidState(msg) => ApiError::InvalidState(msg),
            DomainError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Unavailable(msg) => ApiError::Unavailable(msg),
            DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::from(StoreError::from(err)).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::RateLimited { retry_after_secs: 1 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ApiError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = ApiError::InvalidState("User is already suspended".into()).into_response();
        let body = body_json(response).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["kind"], "invalid_state");
        assert_eq!(body["error"]["message"], "User is already suspended");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_message_is_hidden() {
        let response =
            ApiError::Internal("connection reset by peer at 10.0.0.3".into()).into_response();
        let body = body_json(response).await;

        assert_eq!(body["error"]["kind"], "internal");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
        let body = body_json(response).await;
        assert_eq!(body["error"]["kind"], "rate_limited");
    }

    #[test]
    fn test_from_domain_error_preserves_kind() {
        let error: ApiError = DomainError::Conflict("Discount code already exists".into()).into();
        assert_eq!(error.kind(), "conflict");
        assert_eq!(error.status(), StatusCode::CONFLICT);

        let error: ApiError = DomainError::Unavailable("db down".into()).into();
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_from_sqlx_pool_timeout_is_unavailable() {
        let error: ApiError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_validation_errors_carry_details() {
        use validator::Validate;

        let request = domain::models::LoginRequest {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let error: ApiError = request.validate().unwrap_err().into();
        assert_eq!(error.kind(), "invalid_input");

        let body = body_json(error.into_response()).await;
        let details = body["error"]["details"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0]["field"], "email");
        assert_eq!(details[1]["field"], "password");
        assert_eq!(body["error"]["message"], "2 validation errors");
    }
}
