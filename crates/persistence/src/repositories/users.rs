//! Platform users, admin actors and admin sessions.

use chrono::{DateTime, Utc};
use domain::errors::DomainError;
use domain::models::{AdminRole, User, UserRole};
use domain::services::{audit_helpers, AuditFailureMode};
use shared::pagination::PageRequest;
use sqlx::PgPool;
use uuid::Uuid;

use super::audit_log::AuditLogRepository;
use crate::entities::{AdminSessionEntity, CredentialsEntity, UserEntity, UserRoleDb, USER_COLUMNS};
use crate::error::{is_unique_violation, to_domain};
use crate::metrics::QueryTimer;
use crate::retry::retry_read;

const ADMIN_ROLES: &str = "u.role IN ('ADMIN', 'SUPER_ADMIN')";

/// Input for creating an admin account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: AdminRole,
}

/// Repository for users and admin actors.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS);
        let timer = QueryTimer::new("find_user_by_id");
        let entity = retry_read("find_user_by_id", || {
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await?;
        timer.record();
        Ok(entity.map(Into::into))
    }

    /// Case-insensitive lookup including the password hash, for sign-in only.
    pub async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialsEntity>, sqlx::Error> {
        retry_read("find_credentials_by_email", || {
            sqlx::query_as::<_, CredentialsEntity>(
                r#"
                SELECT id, email, name, role, password_hash, is_active, is_suspended
                FROM users
                WHERE LOWER(email) = LOWER($1)
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
        })
        .await
    }

    pub async fn record_login(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Admin actors, newest first.
    pub async fn list_admins(&self, page: PageRequest) -> Result<(Vec<User>, i64), sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM users u WHERE {} ORDER BY u.created_at DESC, u.id DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS, ADMIN_ROLES
        );
        let count_sql = format!("SELECT COUNT(*) FROM users u WHERE {}", ADMIN_ROLES);

        let timer = QueryTimer::new("list_admins");
        let rows = retry_read("list_admins", || {
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(page.limit_i64())
                .bind(page.offset())
                .fetch_all(&self.pool)
        })
        .await?;
        let total = retry_read("count_admins", || {
            sqlx::query_scalar::<_, i64>(&count_sql).fetch_one(&self.pool)
        })
        .await?;
        timer.record();

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    pub async fn find_admin(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM users u WHERE u.id = $1 AND {}",
            USER_COLUMNS, ADMIN_ROLES
        );
        let entity = retry_read("find_admin", || {
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await?;
        Ok(entity.map(Into::into))
    }

    pub async fn count_active_super_admins(&self) -> Result<i64, sqlx::Error> {
        retry_read("count_active_super_admins", || {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE role = 'SUPER_ADMIN' AND is_active",
            )
            .fetch_one(&self.pool)
        })
        .await
    }

    /// Creates an admin account and records `ADMIN_CREATED`.
    pub async fn create_admin(
        &self,
        actor_id: Uuid,
        admin: &NewAdmin,
        audit_mode: AuditFailureMode,
    ) -> Result<User, DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let sql = format!(
            r#"
            INSERT INTO users (email, name, password_hash, role, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {}
            "#,
            USER_COLUMNS.replace("u.", "")
        );
        let user: User = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(admin.email.trim())
            .bind(admin.name.trim())
            .bind(&admin.password_hash)
            .bind(UserRoleDb::from(admin.role.as_user_role()))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "users_email_key") {
                    DomainError::Conflict("An account with this email already exists".into())
                } else {
                    to_domain(e)
                }
            })?
            .into();

        let record =
            audit_helpers::admin_created(actor_id, user.id, &user.email, user.role.as_str());
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        tracing::info!(admin_id = %user.id, actor_id = %actor_id, "Admin account created");
        Ok(user)
    }

    /// Moves an admin between ADMIN and SUPER_ADMIN and records `ADMIN_ROLE_CHANGED`.
    pub async fn change_admin_role(
        &self,
        actor_id: Uuid,
        admin_id: Uuid,
        role: AdminRole,
        audit_mode: AuditFailureMode,
    ) -> Result<User, DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let lock_sql = format!(
            "SELECT {} FROM users u WHERE u.id = $1 AND {} FOR UPDATE",
            USER_COLUMNS, ADMIN_ROLES
        );
        let current: User = sqlx::query_as::<_, UserEntity>(&lock_sql)
            .bind(admin_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(to_domain)?
            .ok_or_else(|| DomainError::NotFound("Admin not found".into()))?
            .into();

        let new_role = role.as_user_role();
        if current.role == new_role {
            return Err(DomainError::InvalidState(format!(
                "Admin already has role {}",
                new_role
            )));
        }

        if current.role == UserRole::SuperAdmin && current.is_active {
            // Lock every active super admin so concurrent demotions queue up.
            let remaining: Vec<Uuid> = sqlx::query_scalar(
                "SELECT id FROM users WHERE role = 'SUPER_ADMIN' AND is_active ORDER BY id FOR UPDATE",
            )
            .fetch_all(&mut *tx)
            .await
            .map_err(to_domain)?;
            if remaining.len() <= 1 {
                return Err(DomainError::InvalidState(
                    "Cannot demote the last active super admin".into(),
                ));
            }
        }

        let update_sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS.replace("u.", "")
        );
        let updated: User = sqlx::query_as::<_, UserEntity>(&update_sql)
            .bind(admin_id)
            .bind(UserRoleDb::from(new_role))
            .fetch_one(&mut *tx)
            .await
            .map_err(to_domain)?
            .into();

        let record = audit_helpers::admin_role_changed(
            actor_id,
            admin_id,
            current.role.as_str(),
            updated.role.as_str(),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        Ok(updated)
    }

    /// Replaces a user's admin notes and records `USER_NOTES_UPDATED`.
    pub async fn update_notes(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        notes: &str,
        audit_mode: AuditFailureMode,
    ) -> Result<User, DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let old_notes: Option<Option<String>> =
            sqlx::query_scalar("SELECT admin_notes FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(to_domain)?;
        let old_notes = old_notes.ok_or_else(|| DomainError::NotFound("User not found".into()))?;

        let sql = format!(
            "UPDATE users SET admin_notes = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS.replace("u.", "")
        );
        let user: User = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(user_id)
            .bind(notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(to_domain)?
            .into();

        let record =
            audit_helpers::user_notes_updated(actor_id, user_id, old_notes.as_deref(), notes);
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        Ok(user)
    }

    /// Guarantees an active SUPER_ADMIN exists.
    ///
    /// Returns `None` when one already does; otherwise creates the account for
    /// `email`, or promotes and reactivates it if it exists. An existing
    /// password is kept.
    pub async fn ensure_super_admin(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'SUPER_ADMIN' AND is_active",
        )
        .fetch_one(&mut *tx)
        .await?;
        if existing > 0 {
            return Ok(None);
        }

        let columns = USER_COLUMNS.replace("u.", "");
        let promote_sql = format!(
            r#"
            UPDATE users
            SET role = 'SUPER_ADMIN', is_active = TRUE,
                password_hash = COALESCE(password_hash, $2), updated_at = NOW()
            WHERE LOWER(email) = LOWER($1)
            RETURNING {}
            "#,
            columns
        );
        let promoted = sqlx::query_as::<_, UserEntity>(&promote_sql)
            .bind(email)
            .bind(password_hash)
            .fetch_optional(&mut *tx)
            .await?;

        let entity = match promoted {
            Some(entity) => entity,
            None => {
                let insert_sql = format!(
                    r#"
                    INSERT INTO users (email, name, password_hash, role, is_active)
                    VALUES ($1, $2, $3, 'SUPER_ADMIN', TRUE)
                    RETURNING {}
                    "#,
                    columns
                );
                sqlx::query_as::<_, UserEntity>(&insert_sql)
                    .bind(email)
                    .bind(name)
                    .bind(password_hash)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(Some(entity.into()))
    }
}

/// Repository for admin sessions.
#[derive(Clone)]
pub struct AdminSessionRepository {
    pool: PgPool,
}

impl AdminSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        token_fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AdminSessionEntity, sqlx::Error> {
        sqlx::query_as::<_, AdminSessionEntity>(
            r#"
            INSERT INTO admin_sessions (user_id, token_fingerprint, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_fingerprint, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_fingerprint)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_fingerprint(
        &self,
        token_fingerprint: &str,
    ) -> Result<Option<AdminSessionEntity>, sqlx::Error> {
        retry_read("find_admin_session", || {
            sqlx::query_as::<_, AdminSessionEntity>(
                r#"
                SELECT id, user_id, token_fingerprint, expires_at, created_at
                FROM admin_sessions
                WHERE token_fingerprint = $1
                "#,
            )
            .bind(token_fingerprint)
            .fetch_optional(&self.pool)
        })
        .await
    }

    /// Returns whether a session was removed.
    pub async fn delete_by_fingerprint(
        &self,
        token_fingerprint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token_fingerprint = $1")
            .bind(token_fingerprint)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes one admin's sessions that are past their expiry.
    pub async fn delete_expired_for(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM admin_sessions WHERE user_id = $1 AND expires_at <= NOW()",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returning_list_drops_alias() {
        let columns = USER_COLUMNS.replace("u.", "");
        assert!(columns.starts_with("id, email, name"));
        assert!(!columns.contains("u."));
    }
}
