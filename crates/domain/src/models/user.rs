//! Platform user models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Platform-wide role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Creator,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// Whether accounts with this role may sign in to the back office.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Creator => "CREATOR",
            UserRole::Admin => "ADMIN",
            UserRole::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn all() -> &'static [UserRole] {
        &[
            UserRole::User,
            UserRole::Creator,
            UserRole::Admin,
            UserRole::SuperAdmin,
        ]
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(UserRole::User),
            "CREATOR" => Ok(UserRole::Creator),
            "ADMIN" => Ok(UserRole::Admin),
            "SUPER_ADMIN" => Ok(UserRole::SuperAdmin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// Requested length of a suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuspensionDuration {
    Temporary,
    Permanent,
}

/// A platform user as seen by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub role: UserRole,
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

/// List filters for users.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_suspended: Option<bool>,
}

/// Request body for replacing a user's admin notes.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserNotesRequest {
    #[validate(length(max = 5000, message = "Admin notes must not exceed 5000 characters"))]
    pub admin_notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("super_admin".parse::<UserRole>().unwrap(), UserRole::SuperAdmin);
        assert_eq!("CREATOR".parse::<UserRole>().unwrap(), UserRole::Creator);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_display_roundtrip() {
        for role in UserRole::all() {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), *role);
        }
    }

    #[test]
    fn test_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::SuperAdmin.is_admin());
        assert!(!UserRole::Creator.is_admin());
        assert!(!UserRole::User.is_admin());
    }

    #[test]
    fn test_role_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&UserRole::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );
    }

    #[test]
    fn test_notes_length_limit() {
        let ok = UpdateUserNotesRequest {
            admin_notes: "Repeat offender, see report history".into(),
        };
        assert!(ok.validate().is_ok());
        let too_long = UpdateUserNotesRequest {
            admin_notes: "x".repeat(5001),
        };
        assert!(too_long.validate().is_err());
    }
}
