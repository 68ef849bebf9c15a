//! Post, comment and stream entities.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Post columns plus derived like and comment counts.
pub const POST_COLUMNS: &str = "p.id, p.author_id, p.content, p.post_type, p.is_hidden, \
    p.is_flagged, p.hidden_reason, p.hidden_by, p.hidden_at, p.deleted_at, p.deleted_by, \
    p.deletion_reason, p.created_at, \
    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count, \
    (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id AND cm.deleted_at IS NULL) AS comments_count";

pub const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.author_id, c.content, c.is_hidden, \
    c.hidden_reason, c.hidden_by, c.hidden_at, c.deleted_at, c.deleted_by, \
    c.deletion_reason, c.created_at";

pub const STREAM_COLUMNS: &str = "s.id, s.user_id, s.title, s.description, s.is_live, \
    s.viewer_count, s.started_at, s.ended_at, s.ended_by, s.end_reason, s.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct PostEntity {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub post_type: String,
    pub is_hidden: bool,
    pub is_flagged: bool,
    pub hidden_reason: Option<String>,
    pub hidden_by: Option<Uuid>,
    pub hidden_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub deletion_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

impl From<PostEntity> for domain::models::Post {
    fn from(entity: PostEntity) -> Self {
        Self {
            id: entity.id,
            author_id: entity.author_id,
            content: entity.content,
            post_type: entity.post_type,
            is_hidden: entity.is_hidden,
            is_flagged: entity.is_flagged,
            hidden_reason: entity.hidden_reason,
            hidden_by: entity.hidden_by,
            hidden_at: entity.hidden_at,
            deleted_at: entity.deleted_at,
            deleted_by: entity.deleted_by,
            deletion_reason: entity.deletion_reason,
            likes_count: entity.likes_count,
            comments_count: entity.comments_count,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentEntity {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub is_hidden: bool,
    pub hidden_reason: Option<String>,
    pub hidden_by: Option<Uuid>,
    pub hidden_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub deletion_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CommentEntity> for domain::models::Comment {
    fn from(entity: CommentEntity) -> Self {
        Self {
            id: entity.id,
            post_id: entity.post_id,
            author_id: entity.author_id,
            content: entity.content,
            is_hidden: entity.is_hidden,
            hidden_reason: entity.hidden_reason,
            hidden_by: entity.hidden_by,
            hidden_at: entity.hidden_at,
            deleted_at: entity.deleted_at,
            deleted_by: entity.deleted_by,
            deletion_reason: entity.deletion_reason,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StreamEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_live: bool,
    pub viewer_count: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended_by: Option<Uuid>,
    pub end_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StreamEntity> for domain::models::Stream {
    fn from(entity: StreamEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            title: entity.title,
            description: entity.description,
            is_live: entity.is_live,
            viewer_count: entity.viewer_count,
            started_at: entity.started_at,
            ended_at: entity.ended_at,
            ended_by: entity.ended_by,
            end_reason: entity.end_reason,
            created_at: entity.created_at,
        }
    }
}
