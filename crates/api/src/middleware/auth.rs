//! Admin authentication middleware.
//!
//! Validates the bearer token, checks the session and actor, applies the
//! access level of the route group, and stores an [`AuthenticatedAdmin`] in
//! request extensions for the [`AdminAuth`](crate::extractors::AdminAuth)
//! extractor.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use domain::models::AccessLevel;
use domain::services::authorize;

use crate::app::AppState;
use crate::error::ApiError;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(
    state: &AppState,
    mut req: Request<Body>,
    next: Next,
    level: AccessLevel,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or_else(|| {
        ApiError::Unauthenticated("Missing or invalid Authorization header".to_string())
    })?;

    let admin = state.auth.authenticate(token).await.map_err(|e| {
        tracing::debug!(error = %e, "Admin authentication failed");
        ApiError::from(e)
    })?;
    authorize(Some(&admin.actor), level)?;

    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}

/// Middleware that requires an active ADMIN or SUPER_ADMIN.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&state, req, next, AccessLevel::Admin).await
}

/// Middleware that requires an active SUPER_ADMIN.
pub async fn require_super_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&state, req, next, AccessLevel::SuperAdmin).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/auth/me");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_present() {
        let req = request_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&request_with_auth(None)), None);
        assert_eq!(bearer_token(&request_with_auth(Some("Basic Zm9vOmJhcg=="))), None);
        assert_eq!(bearer_token(&request_with_auth(Some("Bearer   "))), None);
    }
}
