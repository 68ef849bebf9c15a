//! Report entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::{ReportReasonDb, ReportStatusDb};

pub const REPORT_COLUMNS: &str = "r.id, r.reporter_id, r.reported_user_id, r.post_id, \
    r.stream_id, r.reason, r.description, r.status, r.reviewed_by, r.reviewed_at, \
    r.resolution, r.action_taken, r.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct ReportEntity {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub stream_id: Option<Uuid>,
    pub reason: ReportReasonDb,
    pub description: Option<String>,
    pub status: ReportStatusDb,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub action_taken: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReportEntity> for domain::models::Report {
    fn from(entity: ReportEntity) -> Self {
        Self {
            id: entity.id,
            reporter_id: entity.reporter_id,
            reported_user_id: entity.reported_user_id,
            post_id: entity.post_id,
            stream_id: entity.stream_id,
            reason: entity.reason.into(),
            description: entity.description,
            status: entity.status.into(),
            reviewed_by: entity.reviewed_by,
            reviewed_at: entity.reviewed_at,
            resolution: entity.resolution,
            action_taken: entity.action_taken,
            created_at: entity.created_at,
        }
    }
}
