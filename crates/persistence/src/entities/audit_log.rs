//! Audit log entity.

use chrono::{DateTime, Utc};
use domain::models::{AuditAction, AuditRecord, SubjectKind};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Select list for audit rows joined to the acting user (`al` / `actor`).
pub const AUDIT_COLUMNS: &str = "al.id, al.actor_id, actor.email AS actor_email, al.action, \
    al.subject_kind, al.subject_id, al.affected_user_id, al.description, al.metadata, \
    al.created_at";

/// Database entity for audit logs.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,
    pub actor_id: Uuid,
    /// Joined from users; absent if the actor row no longer exists.
    pub actor_email: Option<String>,
    pub action: String,
    pub subject_kind: String,
    pub subject_id: Uuid,
    pub affected_user_id: Option<Uuid>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogEntity> for AuditRecord {
    type Error = sqlx::Error;

    fn try_from(entity: AuditLogEntity) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(&entity.action)
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        let subject_kind = SubjectKind::from_str(&entity.subject_kind)
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Self {
            id: entity.id,
            actor_id: entity.actor_id,
            actor_email: entity.actor_email,
            action,
            subject_kind,
            subject_id: entity.subject_id,
            affected_user_id: entity.affected_user_id,
            description: entity.description,
            metadata: entity.metadata,
            created_at: entity.created_at,
        })
    }
}

/// Count per action for statistics.
#[derive(Debug, Clone, FromRow)]
pub struct ActionCountEntity {
    pub action: String,
    pub count: i64,
}

/// Count per actor for statistics.
#[derive(Debug, Clone, FromRow)]
pub struct ActorActivityEntity {
    pub actor_id: Uuid,
    pub actor_email: Option<String>,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(action: &str, kind: &str) -> AuditLogEntity {
        AuditLogEntity {
            id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            actor_email: Some("root@example.com".into()),
            action: action.into(),
            subject_kind: kind.into(),
            subject_id: Uuid::new_v4(),
            affected_user_id: None,
            description: None,
            metadata: serde_json::json!({"reason": "spam everywhere"}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_converts_to_record() {
        let record = AuditRecord::try_from(entity("USER_SUSPENDED", "USER")).unwrap();
        assert_eq!(record.action, AuditAction::UserSuspended);
        assert_eq!(record.subject_kind, SubjectKind::User);
        assert_eq!(record.metadata["reason"], "spam everywhere");
    }

    #[test]
    fn test_unknown_action_is_decode_error() {
        let err = AuditRecord::try_from(entity("device.assign", "USER")).unwrap_err();
        assert!(matches!(err, sqlx::Error::Decode(_)));
    }
}
