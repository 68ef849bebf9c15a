//! Role-gated access policy.

use crate::errors::DomainError;
use crate::models::{AccessLevel, Actor};

/// Checks that `actor` satisfies `required`.
///
/// Returns the actor on success so callers can chain on it. Pure: no I/O.
pub fn authorize(actor: Option<&Actor>, required: AccessLevel) -> Result<&Actor, DomainError> {
    let actor = actor.ok_or_else(|| {
        DomainError::Unauthenticated("Authentication required".to_string())
    })?;

    if !actor.is_active {
        return Err(DomainError::Unauthenticated(
            "Account is deactivated".to_string(),
        ));
    }

    if actor.role.level() < required {
        return Err(DomainError::Forbidden(format!(
            "{} access required",
            required
        )));
    }

    Ok(actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::AdminRole;
    use uuid::Uuid;

    fn actor(role: AdminRole) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            email: "moderator@example.com".to_string(),
            name: Some("Moderator".to_string()),
            role,
            is_active: true,
        }
    }

    #[test]
    fn test_missing_actor_is_unauthenticated() {
        let err = authorize(None, AccessLevel::Authenticated).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn test_admin_levels() {
        let admin = actor(AdminRole::Admin);
        assert!(authorize(Some(&admin), AccessLevel::Authenticated).is_ok());
        assert!(authorize(Some(&admin), AccessLevel::Admin).is_ok());

        let err = authorize(Some(&admin), AccessLevel::SuperAdmin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "SUPER_ADMIN access required");
    }

    #[test]
    fn test_super_admin_passes_everything() {
        let root = actor(AdminRole::SuperAdmin);
        for level in [
            AccessLevel::Authenticated,
            AccessLevel::Admin,
            AccessLevel::SuperAdmin,
        ] {
            assert_eq!(authorize(Some(&root), level).unwrap().id, root.id);
        }
    }

    #[test]
    fn test_inactive_actor_rejected() {
        let mut admin = actor(AdminRole::SuperAdmin);
        admin.is_active = false;
        let err = authorize(Some(&admin), AccessLevel::Authenticated).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }
}
