//! Administrator account management.
//!
//! Listing is open to any admin; provisioning and role changes need a
//! SUPER_ADMIN. Deactivation goes through the transition endpoint.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{AdminSummary, ChangeAdminRoleRequest, CreateAdminRequest, Page};
use persistence::repositories::{NewAdmin, UserRepository};
use shared::pagination::PageRequest;
use shared::password::{hash_password, password_strength_issues};
use uuid::Uuid;

use super::PageQuery;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, ApiPath, ApiQuery, ValidatedJson};
use crate::response::{ApiResponse, Paginated};

/// GET /api/v1/admins
pub async fn list_admins(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<AdminSummary>>, ApiError> {
    let page = PageRequest::new(query.page, query.limit);
    let repo = UserRepository::new(state.pool.clone());
    let (admins, total) = repo.list_admins(page).await?;

    let data = admins.iter().filter_map(AdminSummary::from_user).collect();
    Ok(Json(Page::new(data, page, total.max(0) as u64).into()))
}

/// POST /api/v1/admins
pub async fn create_admin(
    State(state): State<AppState>,
    auth: AdminAuth,
    ValidatedJson(request): ValidatedJson<CreateAdminRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminSummary>>), ApiError> {
    let issues = password_strength_issues(&request.password);
    if !issues.is_empty() {
        return Err(ApiError::InvalidInput(format!(
            "Password is too weak: {}",
            issues.join(", ")
        )));
    }

    // Hashing runs on the blocking pool.
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    let new_admin = NewAdmin {
        email: request.email.trim().to_lowercase(),
        name: request.name,
        password_hash,
        role: request.role,
    };
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .create_admin(auth.actor.id, &new_admin, state.audit_mode)
        .await?;

    let summary = AdminSummary::from_user(&user)
        .ok_or_else(|| ApiError::Internal("Created account has no admin role".to_string()))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(summary))))
}

/// PATCH /api/v1/admins/:id/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath(admin_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<ChangeAdminRoleRequest>,
) -> Result<Json<ApiResponse<AdminSummary>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .change_admin_role(auth.actor.id, admin_id, request.role, state.audit_mode)
        .await?;

    tracing::info!(
        actor_id = %auth.actor.id,
        admin_id = %admin_id,
        role = %request.role,
        "Admin role changed"
    );
    let summary = AdminSummary::from_user(&user)
        .ok_or_else(|| ApiError::Internal("Updated account has no admin role".to_string()))?;
    Ok(Json(ApiResponse::ok(summary)))
}
