//! Audit log domain models.
//!
//! Audit records are append-only. They reference actors and subjects by id only
//! and outlive the rows they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

use super::subject::SubjectKind;

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Transitions
    UserSuspended,
    UserUnsuspended,
    CreatorApproved,
    CreatorRejected,
    PostHidden,
    PostUnhidden,
    PostDeleted,
    CommentHidden,
    CommentUnhidden,
    CommentDeleted,
    StreamEnded,
    ReportReviewed,
    ReportResolved,
    ReportDismissed,
    PaymentRefunded,
    AdminDeactivated,
    AdminReactivated,

    // Catalog and notes
    DiscountCodeCreated,
    DiscountCodeUpdated,
    DiscountCodeDeleted,
    GiftCreated,
    GiftUpdated,
    GiftDeleted,
    UserNotesUpdated,

    // Actor management
    AdminCreated,
    AdminRoleChanged,
    AdminLogin,
    AdminLogout,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserSuspended => "USER_SUSPENDED",
            AuditAction::UserUnsuspended => "USER_UNSUSPENDED",
            AuditAction::CreatorApproved => "CREATOR_APPROVED",
            AuditAction::CreatorRejected => "CREATOR_REJECTED",
            AuditAction::PostHidden => "POST_HIDDEN",
            AuditAction::PostUnhidden => "POST_UNHIDDEN",
            AuditAction::PostDeleted => "POST_DELETED",
            AuditAction::CommentHidden => "COMMENT_HIDDEN",
            AuditAction::CommentUnhidden => "COMMENT_UNHIDDEN",
            AuditAction::CommentDeleted => "COMMENT_DELETED",
            AuditAction::StreamEnded => "STREAM_ENDED",
            AuditAction::ReportReviewed => "REPORT_REVIEWED",
            AuditAction::ReportResolved => "REPORT_RESOLVED",
            AuditAction::ReportDismissed => "REPORT_DISMISSED",
            AuditAction::PaymentRefunded => "PAYMENT_REFUNDED",
            AuditAction::AdminDeactivated => "ADMIN_DEACTIVATED",
            AuditAction::AdminReactivated => "ADMIN_REACTIVATED",
            AuditAction::DiscountCodeCreated => "DISCOUNT_CODE_CREATED",
            AuditAction::DiscountCodeUpdated => "DISCOUNT_CODE_UPDATED",
            AuditAction::DiscountCodeDeleted => "DISCOUNT_CODE_DELETED",
            AuditAction::GiftCreated => "GIFT_CREATED",
            AuditAction::GiftUpdated => "GIFT_UPDATED",
            AuditAction::GiftDeleted => "GIFT_DELETED",
            AuditAction::UserNotesUpdated => "USER_NOTES_UPDATED",
            AuditAction::AdminCreated => "ADMIN_CREATED",
            AuditAction::AdminRoleChanged => "ADMIN_ROLE_CHANGED",
            AuditAction::AdminLogin => "ADMIN_LOGIN",
            AuditAction::AdminLogout => "ADMIN_LOGOUT",
        }
    }

    pub fn all() -> &'static [AuditAction] {
        &[
            AuditAction::UserSuspended,
            AuditAction::UserUnsuspended,
            AuditAction::CreatorApproved,
            AuditAction::CreatorRejected,
            AuditAction::PostHidden,
            AuditAction::PostUnhidden,
            AuditAction::PostDeleted,
            AuditAction::CommentHidden,
            AuditAction::CommentUnhidden,
            AuditAction::CommentDeleted,
            AuditAction::StreamEnded,
            AuditAction::ReportReviewed,
            AuditAction::ReportResolved,
            AuditAction::ReportDismissed,
            AuditAction::PaymentRefunded,
            AuditAction::AdminDeactivated,
            AuditAction::AdminReactivated,
            AuditAction::DiscountCodeCreated,
            AuditAction::DiscountCodeUpdated,
            AuditAction::DiscountCodeDeleted,
            AuditAction::GiftCreated,
            AuditAction::GiftUpdated,
            AuditAction::GiftDeleted,
            AuditAction::UserNotesUpdated,
            AuditAction::AdminCreated,
            AuditAction::AdminRoleChanged,
            AuditAction::AdminLogin,
            AuditAction::AdminLogout,
        ]
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown audit action: {}", s))
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_email: Option<String>,
    pub action: AuditAction,
    pub subject_kind: SubjectKind,
    pub subject_id: Uuid,
    pub affected_user_id: Option<Uuid>,
    pub description: Option<String>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Input for appending an audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditRecord {
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub subject_kind: SubjectKind,
    pub subject_id: Uuid,
    pub affected_user_id: Option<Uuid>,
    pub description: Option<String>,
    pub metadata: JsonValue,
}

/// Query parameters for listing audit records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub affected_user_id: Option<Uuid>,
    pub subject_kind: Option<SubjectKind>,
    pub action_kind: Option<AuditAction>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Date range for audit statistics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCount {
    pub action: AuditAction,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorActivity {
    pub actor_id: Uuid,
    pub actor_email: Option<String>,
    pub count: i64,
}

/// Aggregate view of audit activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total: i64,
    pub by_action: Vec<ActionCount>,
    pub by_actor: Vec<ActorActivity>,
    pub recent: Vec<AuditRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_from_str() {
        assert_eq!(
            AuditAction::from_str("USER_SUSPENDED").unwrap(),
            AuditAction::UserSuspended
        );
        assert_eq!(
            AuditAction::from_str("payment_refunded").unwrap(),
            AuditAction::PaymentRefunded
        );
        assert!(AuditAction::from_str("device.assign").is_err());
    }

    #[test]
    fn test_audit_action_display_roundtrip() {
        for action in AuditAction::all() {
            assert_eq!(action.to_string().parse::<AuditAction>().unwrap(), *action);
        }
    }

    #[test]
    fn test_audit_action_serde_matches_display() {
        for action in AuditAction::all() {
            let json = serde_json::to_string(action).unwrap();
            assert_eq!(json, format!("\"{}\"", action));
        }
    }

    #[test]
    fn test_audit_query_parses_camel_case() {
        let query: AuditLogQuery = serde_json::from_value(serde_json::json!({
            "actionKind": "POST_HIDDEN",
            "subjectKind": "POST",
            "page": 2
        }))
        .unwrap();
        assert_eq!(query.action_kind, Some(AuditAction::PostHidden));
        assert_eq!(query.subject_kind, Some(SubjectKind::Post));
        assert_eq!(query.page, Some(2));
    }
}
