//! Super admin bootstrap for initial setup.
//!
//! Guarantees an active SUPER_ADMIN exists when the bootstrap credentials are
//! configured. Runs once after migrations; a no-op once any active super
//! admin exists.

use persistence::repositories::UserRepository;
use shared::password::{hash_password, password_strength_issues, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::BootstrapConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Ensures the configured super admin exists.
pub async fn bootstrap_super_admin(
    pool: &PgPool,
    config: &BootstrapConfig,
) -> Result<(), BootstrapError> {
    let email = config.super_admin_email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let issues = password_strength_issues(&config.super_admin_password);
    if !issues.is_empty() {
        return Err(BootstrapError::Config(format!(
            "bootstrap.super_admin_password is too weak: {}",
            issues.join(", ")
        )));
    }

    let password_hash = hash_password(&config.super_admin_password)?;
    let users = UserRepository::new(pool.clone());

    match users
        .ensure_super_admin(email, config.super_admin_name.trim(), &password_hash)
        .await?
    {
        Some(user) => {
            info!(
                email = %user.email,
                user_id = %user.id,
                "Bootstrap super admin ready"
            );
            warn!(
                "SECURITY: Remove BO__BOOTSTRAP__SUPER_ADMIN_EMAIL and \
                 BO__BOOTSTRAP__SUPER_ADMIN_PASSWORD from the environment after first login"
            );
        }
        None => info!("Active super admin already exists - skipping bootstrap"),
    }

    Ok(())
}
