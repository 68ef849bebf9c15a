//! Administrator identity and privilege levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::{User, UserRole};

/// Role of an administrator. Only these two roles may act in the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    /// Maps a platform role to an admin role, if it is one.
    pub fn from_user_role(role: UserRole) -> Option<Self> {
        match role {
            UserRole::Admin => Some(AdminRole::Admin),
            UserRole::SuperAdmin => Some(AdminRole::SuperAdmin),
            UserRole::User | UserRole::Creator => None,
        }
    }

    pub fn as_user_role(&self) -> UserRole {
        match self {
            AdminRole::Admin => UserRole::Admin,
            AdminRole::SuperAdmin => UserRole::SuperAdmin,
        }
    }

    /// Highest access level this role satisfies.
    pub fn level(&self) -> AccessLevel {
        match self {
            AdminRole::Admin => AccessLevel::Admin,
            AdminRole::SuperAdmin => AccessLevel::SuperAdmin,
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_user_role().fmt(f)
    }
}

/// Privilege required by an operation.
/// Hierarchy: SuperAdmin > Admin > Authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    Authenticated,
    Admin,
    SuperAdmin,
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessLevel::Authenticated => write!(f, "AUTHENTICATED"),
            AccessLevel::Admin => write!(f, "ADMIN"),
            AccessLevel::SuperAdmin => write!(f, "SUPER_ADMIN"),
        }
    }
}

/// An authenticated administrator performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: AdminRole,
    pub is_active: bool,
}

impl Actor {
    /// Builds an actor from a user row; `None` when the user holds no admin role.
    pub fn from_user(user: &User) -> Option<Self> {
        AdminRole::from_user_role(user.role).map(|role| Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role,
            is_active: user.is_active,
        })
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }
}

/// Summary row for the administrator list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AdminSummary {
    /// `None` when the user holds no admin role.
    pub fn from_user(user: &User) -> Option<Self> {
        AdminRole::from_user_role(user.role).map(|role| Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        })
    }
}

/// Request to provision a new administrator.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 12, max = 128, message = "Password must be between 12 and 128 characters"))]
    pub password: String,
    pub role: AdminRole,
}

/// Request to change an administrator's role.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAdminRoleRequest {
    pub role: AdminRole,
}

/// Admin login credentials.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub actor: Actor,
}
