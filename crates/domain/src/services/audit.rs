//! Audit record construction and the failure policy for auxiliary audit writes.
//!
//! Transition audits are written inside the transition's own transaction and
//! never go through [`AuditFailureMode`]. Everything else (catalog edits, notes,
//! actor management, logins) is auxiliary: the policy decides whether a failed
//! audit insert aborts the primary write.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::models::{AuditAction, NewAuditRecord, SubjectKind};

/// Builder for audit records with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditRecordBuilder {
    actor_id: Uuid,
    action: AuditAction,
    subject_kind: SubjectKind,
    subject_id: Uuid,
    affected_user_id: Option<Uuid>,
    description: Option<String>,
    metadata: Map<String, JsonValue>,
}

impl AuditRecordBuilder {
    /// Starts a record for an action performed by an administrator.
    ///
    /// The subject defaults to the actor itself until [`on_subject`](Self::on_subject)
    /// is called, which is what login and logout records want.
    pub fn user_action(actor_id: Uuid, action: AuditAction) -> Self {
        Self {
            actor_id,
            action,
            subject_kind: SubjectKind::Admin,
            subject_id: actor_id,
            affected_user_id: None,
            description: None,
            metadata: Map::new(),
        }
    }

    /// Set the subject being acted upon.
    pub fn on_subject(mut self, kind: SubjectKind, id: Uuid) -> Self {
        self.subject_kind = kind;
        self.subject_id = id;
        self
    }

    /// Set the platform user affected by the action.
    pub fn affecting(mut self, user_id: Option<Uuid>) -> Self {
        self.affected_user_id = user_id;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a metadata entry. `null` values are skipped.
    pub fn with_meta(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(JsonValue::Null) | Err(_) => {}
            Ok(value) => {
                self.metadata.insert(key.to_string(), value);
            }
        }
        self
    }

    /// Record a field change as `{"old": .., "new": ..}` under `changes.<field>`.
    pub fn with_change(
        mut self,
        field: &str,
        old: impl Serialize,
        new: impl Serialize,
    ) -> Self {
        let entry = json!({
            "old": serde_json::to_value(old).unwrap_or(JsonValue::Null),
            "new": serde_json::to_value(new).unwrap_or(JsonValue::Null),
        });
        let changes = self
            .metadata
            .entry("changes")
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if let JsonValue::Object(map) = changes {
            map.insert(field.to_string(), entry);
        }
        self
    }

    pub fn build(self) -> NewAuditRecord {
        NewAuditRecord {
            actor_id: self.actor_id,
            action: self.action,
            subject_kind: self.subject_kind,
            subject_id: self.subject_id,
            affected_user_id: self.affected_user_id,
            description: self.description,
            metadata: JsonValue::Object(self.metadata),
        }
    }
}

/// How a failed auxiliary audit insert is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFailureMode {
    /// Log the failure and let the primary write commit.
    #[default]
    FailOpen,
    /// Roll back the primary write and report an internal error.
    FailClosed,
}

impl AuditFailureMode {
    /// Decides the fate of the primary write after an audit insert failed.
    ///
    /// `Ok(())` means "continue and commit"; the error aborts the write.
    pub fn handle_failure(
        &self,
        action: AuditAction,
        error: &DomainError,
    ) -> Result<(), DomainError> {
        match self {
            AuditFailureMode::FailOpen => {
                tracing::warn!(
                    action = %action,
                    error = %error,
                    "Audit write failed; continuing without audit record"
                );
                Ok(())
            }
            AuditFailureMode::FailClosed => {
                tracing::error!(
                    action = %action,
                    error = %error,
                    "Audit write failed; aborting operation"
                );
                Err(DomainError::Internal(format!(
                    "Failed to record audit entry for {}",
                    action
                )))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditFailureMode::FailOpen => "fail_open",
            AuditFailureMode::FailClosed => "fail_closed",
        }
    }
}

impl FromStr for AuditFailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail_open" => Ok(AuditFailureMode::FailOpen),
            "fail_closed" => Ok(AuditFailureMode::FailClosed),
            _ => Err(format!("Unknown audit failure mode: {}", s)),
        }
    }
}

/// Convenience constructors for auxiliary audit records.
pub mod audit_helpers {
    use super::*;

    pub fn admin_login(actor_id: Uuid, email: &str) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, AuditAction::AdminLogin)
            .affecting(Some(actor_id))
            .describe(format!("Admin {} signed in", email))
            .build()
    }

    pub fn admin_logout(actor_id: Uuid) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, AuditAction::AdminLogout)
            .affecting(Some(actor_id))
            .build()
    }

    pub fn admin_created(
        actor_id: Uuid,
        admin_id: Uuid,
        email: &str,
        role: &str,
    ) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, AuditAction::AdminCreated)
            .on_subject(SubjectKind::Admin, admin_id)
            .affecting(Some(admin_id))
            .describe(format!("Created admin {}", email))
            .with_meta("email", email)
            .with_meta("role", role)
            .build()
    }

    pub fn admin_role_changed(
        actor_id: Uuid,
        admin_id: Uuid,
        old_role: &str,
        new_role: &str,
    ) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, AuditAction::AdminRoleChanged)
            .on_subject(SubjectKind::Admin, admin_id)
            .affecting(Some(admin_id))
            .with_change("role", old_role, new_role)
            .build()
    }

    pub fn user_notes_updated(
        actor_id: Uuid,
        user_id: Uuid,
        old_notes: Option<&str>,
        new_notes: &str,
    ) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, AuditAction::UserNotesUpdated)
            .on_subject(SubjectKind::User, user_id)
            .affecting(Some(user_id))
            .with_change("adminNotes", old_notes, new_notes)
            .build()
    }

    pub fn discount_code_changed(
        actor_id: Uuid,
        action: AuditAction,
        code_id: Uuid,
        code: &str,
        details: JsonValue,
    ) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, action)
            .on_subject(SubjectKind::DiscountCode, code_id)
            .describe(format!("Discount code {}", code))
            .with_meta("code", code)
            .with_meta("details", details)
            .build()
    }

    pub fn gift_changed(
        actor_id: Uuid,
        action: AuditAction,
        gift_id: Uuid,
        name: &str,
        details: JsonValue,
    ) -> NewAuditRecord {
        AuditRecordBuilder::user_action(actor_id, action)
            .on_subject(SubjectKind::Gift, gift_id)
            .describe(format!("Gift {}", name))
            .with_meta("name", name)
            .with_meta("details", details)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_builder_defaults_subject_to_actor() {
        let actor_id = Uuid::new_v4();
        let record = AuditRecordBuilder::user_action(actor_id, AuditAction::AdminLogin).build();

        assert_eq!(record.actor_id, actor_id);
        assert_eq!(record.subject_kind, SubjectKind::Admin);
        assert_eq!(record.subject_id, actor_id);
        assert_eq!(record.metadata, json!({}));
    }

    #[test]
    fn test_builder_skips_null_metadata() {
        let record = AuditRecordBuilder::user_action(Uuid::new_v4(), AuditAction::PostHidden)
            .on_subject(SubjectKind::Post, Uuid::new_v4())
            .with_meta("reason", "Graphic content in thumbnail")
            .with_meta("note", Option::<String>::None)
            .build();

        assert_eq!(record.metadata, json!({ "reason": "Graphic content in thumbnail" }));
    }

    #[test]
    fn test_with_change_collects_fields() {
        let record = AuditRecordBuilder::user_action(Uuid::new_v4(), AuditAction::GiftUpdated)
            .with_change("coinPrice", 10, 25)
            .with_change("isActive", true, false)
            .build();

        assert_eq!(record.metadata["changes"]["coinPrice"], json!({ "old": 10, "new": 25 }));
        assert_eq!(record.metadata["changes"]["isActive"]["new"], json!(false));
    }

    #[test]
    fn test_failure_mode_from_str() {
        assert_eq!(
            "fail_open".parse::<AuditFailureMode>().unwrap(),
            AuditFailureMode::FailOpen
        );
        assert_eq!(
            "FAIL_CLOSED".parse::<AuditFailureMode>().unwrap(),
            AuditFailureMode::FailClosed
        );
        assert!("best_effort".parse::<AuditFailureMode>().is_err());
    }

    #[test]
    fn test_failure_mode_handling() {
        let err = DomainError::Unavailable("connection reset".into());

        assert!(AuditFailureMode::FailOpen
            .handle_failure(AuditAction::GiftCreated, &err)
            .is_ok());

        let closed = AuditFailureMode::FailClosed
            .handle_failure(AuditAction::GiftCreated, &err)
            .unwrap_err();
        assert_eq!(closed.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_role_change_helper() {
        let actor = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let record = audit_helpers::admin_role_changed(actor, admin, "ADMIN", "SUPER_ADMIN");

        assert_eq!(record.action, AuditAction::AdminRoleChanged);
        assert_eq!(record.subject_id, admin);
        assert_eq!(record.affected_user_id, Some(admin));
        assert_eq!(record.metadata["changes"]["role"]["new"], json!("SUPER_ADMIN"));
    }
}
