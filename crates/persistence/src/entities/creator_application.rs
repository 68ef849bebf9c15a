//! Creator application entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::ApplicationStatusDb;

pub const APPLICATION_COLUMNS: &str = "a.id, a.user_id, a.status, a.bio, a.category, \
    a.reviewed_by, a.reviewed_at, a.review_note, a.rejection_reason, a.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct CreatorApplicationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ApplicationStatusDb,
    pub bio: Option<String>,
    pub category: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CreatorApplicationEntity> for domain::models::CreatorApplication {
    fn from(entity: CreatorApplicationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            status: entity.status.into(),
            bio: entity.bio,
            category: entity.category,
            reviewed_by: entity.reviewed_by,
            reviewed_at: entity.reviewed_at,
            review_note: entity.review_note,
            rejection_reason: entity.rejection_reason,
            created_at: entity.created_at,
        }
    }
}
