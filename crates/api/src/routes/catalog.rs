//! Discount code and gift catalog management.
//!
//! Plain CRUD, not guarded transitions: each write commits with its audit
//! record under the configured audit failure mode.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateDiscountCodeRequest, CreateGiftRequest, DiscountCode, Gift, RedemptionStats,
    UpdateDiscountCodeRequest, UpdateGiftRequest,
};
use persistence::repositories::{DiscountCodeRepository, GiftRepository};
use shared::validation::normalize_discount_code;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, ApiPath, ValidatedJson};
use crate::response::ApiResponse;

/// POST /api/v1/discount-codes
pub async fn create_discount_code(
    State(state): State<AppState>,
    auth: AdminAuth,
    payload: Result<Json<CreateDiscountCodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<DiscountCode>>), ApiError> {
    let Json(mut request) = payload?;
    // Codes are stored upper case; the format rule applies to the stored form.
    request.code = normalize_discount_code(&request.code);
    request.validate()?;

    let repo = DiscountCodeRepository::new(state.pool.clone());
    let code = repo
        .create(auth.actor.id, &request, state.audit_mode)
        .await?;

    tracing::info!(actor_id = %auth.actor.id, code = %code.code, "Discount code created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(code))))
}

/// PATCH /api/v1/discount-codes/:id
pub async fn update_discount_code(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateDiscountCodeRequest>,
) -> Result<Json<ApiResponse<DiscountCode>>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::InvalidInput("No fields to update".to_string()));
    }

    let repo = DiscountCodeRepository::new(state.pool.clone());
    let code = repo
        .update(auth.actor.id, id, &request, state.audit_mode)
        .await?;
    Ok(Json(ApiResponse::ok(code)))
}

/// DELETE /api/v1/discount-codes/:id
pub async fn delete_discount_code(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = DiscountCodeRepository::new(state.pool.clone());
    repo.delete(auth.actor.id, id, state.audit_mode).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/discount-codes/:id/stats
pub async fn discount_code_stats(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<RedemptionStats>>, ApiError> {
    let repo = DiscountCodeRepository::new(state.pool.clone());
    if repo.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound("Discount code not found".to_string()));
    }
    let stats = repo.stats(id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// POST /api/v1/gifts
pub async fn create_gift(
    State(state): State<AppState>,
    auth: AdminAuth,
    ValidatedJson(request): ValidatedJson<CreateGiftRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Gift>>), ApiError> {
    let repo = GiftRepository::new(state.pool.clone());
    let gift = repo
        .create(auth.actor.id, &request, state.audit_mode)
        .await?;

    tracing::info!(actor_id = %auth.actor.id, gift_id = %gift.id, "Gift created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(gift))))
}

/// PATCH /api/v1/gifts/:id
pub async fn update_gift(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateGiftRequest>,
) -> Result<Json<ApiResponse<Gift>>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::InvalidInput("No fields to update".to_string()));
    }

    let repo = GiftRepository::new(state.pool.clone());
    let gift = repo
        .update(auth.actor.id, id, &request, state.audit_mode)
        .await?;
    Ok(Json(ApiResponse::ok(gift)))
}

/// DELETE /api/v1/gifts/:id
///
/// Gifts that were ever sent cannot be deleted; deactivate them instead.
pub async fn delete_gift(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = GiftRepository::new(state.pool.clone());
    repo.delete(auth.actor.id, id, state.audit_mode).await?;
    Ok(StatusCode::NO_CONTENT)
}
