//! Audit log routes.
//!
//! Read-only: audit records are written by the operations they describe and
//! the table rejects updates and deletes.

use axum::{extract::State, Json};
use domain::models::{AuditLogQuery, AuditRecord, AuditStats, AuditStatsQuery, Page};
use persistence::repositories::AuditLogRepository;
use shared::pagination::PageRequest;
use uuid::Uuid;

use super::PageQuery;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery};
use crate::response::{ApiResponse, Paginated};

fn check_range(
    start: Option<chrono::DateTime<chrono::Utc>>,
    end: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<(), ApiError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(ApiError::InvalidInput(
            "startDate must not be after endDate".to_string(),
        )),
        _ => Ok(()),
    }
}

/// List audit logs with filtering and pagination, newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> Result<Json<Paginated<AuditRecord>>, ApiError> {
    check_range(query.start_date, query.end_date)?;

    let repo = AuditLogRepository::new(state.pool.clone());
    let (records, total) = repo.list(&query).await?;

    let page = PageRequest::new(query.page, query.limit);
    Ok(Json(Page::new(records, page, total.max(0) as u64).into()))
}

/// Get a specific audit log entry.
pub async fn get_audit_log(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<AuditRecord>>, ApiError> {
    let repo = AuditLogRepository::new(state.pool.clone());

    match repo.find_by_id(id).await? {
        Some(record) => Ok(Json(ApiResponse::ok(record))),
        None => Err(ApiError::NotFound("Audit log not found".to_string())),
    }
}

/// Records about one subject, or affecting one user.
pub async fn subject_timeline(
    State(state): State<AppState>,
    ApiPath(subject_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<AuditRecord>>, ApiError> {
    let page = PageRequest::new(query.page, query.limit);
    let repo = AuditLogRepository::new(state.pool.clone());
    let (records, total) = repo.timeline(subject_id, page).await?;
    Ok(Json(Page::new(records, page, total.max(0) as u64).into()))
}

/// Totals by action and by actor, plus the latest records.
pub async fn audit_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuditStatsQuery>,
) -> Result<Json<ApiResponse<AuditStats>>, ApiError> {
    check_range(query.start_date, query.end_date)?;

    let repo = AuditLogRepository::new(state.pool.clone());
    let stats = repo.stats(&query).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_check_range() {
        let now = Utc::now();
        assert!(check_range(None, None).is_ok());
        assert!(check_range(Some(now - Duration::days(1)), Some(now)).is_ok());
        assert!(check_range(Some(now), None).is_ok());
        assert_eq!(
            check_range(Some(now), Some(now - Duration::days(1)))
                .unwrap_err()
                .kind(),
            "invalid_input"
        );
    }
}
