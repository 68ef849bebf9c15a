//! User and admin session entities (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::UserRoleDb;

/// Column list shared by every query that materialises a [`UserEntity`].
pub const USER_COLUMNS: &str = "u.id, u.email, u.name, u.username, u.role, u.is_active, \
    u.is_suspended, u.suspended_reason, u.suspended_by, u.suspended_at, \
    u.suspension_expires_at, u.admin_notes, u.last_login_at, u.created_at";

/// Database row mapping for the users table. The password hash is never loaded here.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub role: UserRoleDb,
    pub is_active: bool,
    pub is_suspended: bool,
    pub suspended_reason: Option<String>,
    pub suspended_by: Option<Uuid>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspension_expires_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            username: entity.username,
            role: entity.role.into(),
            is_active: entity.is_active,
            is_suspended: entity.is_suspended,
            suspended_reason: entity.suspended_reason,
            suspended_by: entity.suspended_by,
            suspended_at: entity.suspended_at,
            suspension_expires_at: entity.suspension_expires_at,
            admin_notes: entity.admin_notes,
            last_login_at: entity.last_login_at,
            created_at: entity.created_at,
        }
    }
}

/// Login lookup row: identity plus the stored password hash.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialsEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRoleDb,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_suspended: bool,
}

/// Database row mapping for the admin_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminSessionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_fingerprint: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminSessionEntity {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::UserRole;

    fn entity() -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: "mod@example.com".into(),
            name: Some("Mod".into()),
            username: None,
            role: UserRoleDb::Admin,
            is_active: true,
            is_suspended: false,
            suspended_reason: None,
            suspended_by: None,
            suspended_at: None,
            suspension_expires_at: None,
            admin_notes: None,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_entity_conversion() {
        let e = entity();
        let id = e.id;
        let user: domain::models::User = e.into();
        assert_eq!(user.id, id);
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = AdminSessionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_fingerprint: "ab".into(),
            expires_at: now + Duration::minutes(5),
            created_at: now,
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::minutes(5)));
    }
}
