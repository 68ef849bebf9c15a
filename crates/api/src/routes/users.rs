//! Platform user administration outside the transition catalogue.

use axum::{extract::State, Json};
use domain::models::{UpdateUserNotesRequest, User};
use persistence::repositories::UserRepository;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, ApiPath, ValidatedJson};
use crate::response::ApiResponse;

/// PUT /api/v1/users/:id/notes
///
/// Replaces the internal notes on a user; an empty string clears them.
pub async fn update_notes(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath(user_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateUserNotesRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .update_notes(auth.actor.id, user_id, &request.admin_notes, state.audit_mode)
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}
