//! Admin authentication routes.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{Actor, LoginRequest, LoginResponse};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, ValidatedJson};
use crate::middleware::metrics::record_login_failure;
use crate::response::ApiResponse;
use crate::services::{AuthError, AuthenticatedAdmin};

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if let Some(limiter) = &state.login_limiter {
        if let Err(retry_after_secs) = limiter.check(&request.email) {
            warn!(retry_after_secs, "Login rate limit exceeded");
            record_login_failure("rate_limited");
            return Err(ApiError::RateLimited { retry_after_secs });
        }
    }

    match state.auth.login(&request.email, &request.password).await {
        Ok(response) => Ok(Json(ApiResponse::ok(response))),
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                record_login_failure("invalid_credentials");
            }
            Err(e.into())
        }
    }
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AdminAuth,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&AuthenticatedAdmin::from(&auth)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(auth: AdminAuth) -> Json<ApiResponse<Actor>> {
    Json(ApiResponse::ok(auth.actor))
}
