//! Admin login, logout and bearer token authentication.
//!
//! A token is only honoured while its session row exists, so logout and
//! admin deactivation revoke access before the JWT itself expires.

use chrono::Utc;
use domain::models::{Actor, AdminRole, LoginResponse, UserRole};
use domain::services::audit_helpers;
use persistence::repositories::{AdminSessionRepository, AuditLogRepository, UserRepository};
use shared::crypto::session_fingerprint;
use shared::jwt::{JwtConfig, JwtError};
use shared::password::verify_password_or_dummy;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session expired or revoked")]
    SessionRevoked,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthenticated("Invalid email or password".to_string())
            }
            AuthError::InvalidToken => {
                ApiError::Unauthenticated("Invalid or expired token".to_string())
            }
            AuthError::SessionRevoked => {
                ApiError::Unauthenticated("Session has expired or been revoked".to_string())
            }
            AuthError::AccountDisabled => {
                ApiError::Unauthenticated("Account is disabled".to_string())
            }
            AuthError::Token(e) => ApiError::Internal(format!("Failed to issue token: {}", e)),
            AuthError::Database(e) => e.into(),
        }
    }
}

/// An actor whose bearer token resolved to a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub actor: Actor,
    pub session_fingerprint: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: AdminSessionRepository,
    audit: AuditLogRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: AdminSessionRepository::new(pool.clone()),
            audit: AuditLogRepository::new(pool),
            jwt,
        }
    }

    /// Verifies credentials and opens a session.
    ///
    /// Unknown emails, wrong passwords, non-admin roles and disabled accounts
    /// all fail with the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let credentials = self.users.find_credentials_by_email(email.trim()).await?;
        let verified = verify_password_or_dummy(
            password,
            credentials.as_ref().and_then(|c| c.password_hash.as_deref()),
        );
        let credentials = match credentials {
            Some(c) if verified => c,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let role = UserRole::from(credentials.role);
        let Some(admin_role) = AdminRole::from_user_role(role) else {
            warn!(user_id = %credentials.id, "Login attempt by non-admin account");
            return Err(AuthError::InvalidCredentials);
        };
        if !credentials.is_active || credentials.is_suspended {
            warn!(user_id = %credentials.id, "Login attempt by disabled admin account");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.jwt.generate_access_token(credentials.id, role.as_str())?;
        self.sessions
            .create(
                credentials.id,
                &session_fingerprint(&issued.jti),
                issued.expires_at,
            )
            .await?;
        self.users.record_login(credentials.id).await?;
        let purged = self.sessions.delete_expired_for(credentials.id).await?;
        if purged > 0 {
            debug!(actor_id = %credentials.id, purged, "Expired sessions removed");
        }

        self.audit
            .insert_async(audit_helpers::admin_login(credentials.id, &credentials.email));
        info!(actor_id = %credentials.id, "Admin logged in");

        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            actor: Actor {
                id: credentials.id,
                email: credentials.email,
                name: credentials.name,
                role: admin_role,
                is_active: true,
            },
        })
    }

    /// Resolves a bearer token to the actor behind it.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedAdmin, AuthError> {
        let claims = self
            .jwt
            .validate_access_token(token)
            .map_err(|_| AuthError::InvalidToken)?;
        let actor_id = claims.actor_id().map_err(|_| AuthError::InvalidToken)?;

        let fingerprint = session_fingerprint(&claims.jti);
        let session = self
            .sessions
            .find_by_fingerprint(&fingerprint)
            .await?
            .ok_or(AuthError::SessionRevoked)?;
        if session.user_id != actor_id || session.is_expired(Utc::now()) {
            return Err(AuthError::SessionRevoked);
        }

        let user = self
            .users
            .find_by_id(actor_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        let actor = Actor::from_user(&user)
            .filter(|actor| actor.is_active && !user.is_suspended)
            .ok_or(AuthError::AccountDisabled)?;

        Ok(AuthenticatedAdmin {
            actor,
            session_fingerprint: fingerprint,
        })
    }

    pub async fn logout(&self, admin: &AuthenticatedAdmin) -> Result<(), AuthError> {
        let deleted = self
            .sessions
            .delete_by_fingerprint(&admin.session_fingerprint)
            .await?;
        if deleted {
            self.audit
                .insert_async(audit_helpers::admin_logout(admin.actor.id));
            info!(actor_id = %admin.actor.id, "Admin logged out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_credential_failures_share_one_message() {
        let invalid: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            invalid.to_string(),
            "Unauthenticated: Invalid email or password"
        );
    }

    #[test]
    fn test_token_failures_are_unauthenticated() {
        for err in [
            AuthError::InvalidToken,
            AuthError::SessionRevoked,
            AuthError::AccountDisabled,
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_issuance_failure_is_internal() {
        let api: ApiError = AuthError::Token(JwtError::EncodingError("boom".into())).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_database_failure_maps_through_store_errors() {
        let api: ApiError = AuthError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
