//! Persistence seam for guarded transitions.
//!
//! A [`TransitionStore`] hands out [`UnitOfWork`]s. Everything done through a
//! unit of work becomes visible atomically on [`UnitOfWork::commit`]; dropping
//! it without committing discards every change. `lock_*` methods take a row
//! lock that is held until the unit of work ends, so a precondition checked
//! after locking cannot be invalidated by a concurrent writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::models::{
    ApplicationStatus, LedgerAdjustment, NewAuditRecord, PaymentStatus, ReportStatus, Subject,
    SubjectKind, UserRole, Wallet,
};

/// A single field-level change to one subject row.
#[derive(Debug, Clone, PartialEq)]
pub enum SubjectMutation {
    SuspendUser {
        user_id: Uuid,
        reason: String,
        by: Uuid,
        at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    },
    UnsuspendUser {
        user_id: Uuid,
    },
    PromoteToCreator {
        user_id: Uuid,
    },
    ReviewApplication {
        application_id: Uuid,
        status: ApplicationStatus,
        by: Uuid,
        at: DateTime<Utc>,
        note: Option<String>,
        rejection_reason: Option<String>,
    },
    SetPostHidden {
        post_id: Uuid,
        hidden: bool,
        by: Uuid,
        at: DateTime<Utc>,
        reason: Option<String>,
    },
    SoftDeletePost {
        post_id: Uuid,
        by: Uuid,
        at: DateTime<Utc>,
        reason: String,
    },
    SetCommentHidden {
        comment_id: Uuid,
        hidden: bool,
        by: Uuid,
        at: DateTime<Utc>,
        reason: Option<String>,
    },
    SoftDeleteComment {
        comment_id: Uuid,
        by: Uuid,
        at: DateTime<Utc>,
        reason: String,
    },
    EndStream {
        stream_id: Uuid,
        by: Uuid,
        at: DateTime<Utc>,
        reason: String,
    },
    UpdateReport {
        report_id: Uuid,
        status: ReportStatus,
        by: Uuid,
        at: DateTime<Utc>,
        resolution: Option<String>,
        action_taken: Option<String>,
    },
    RefundPayment {
        payment_id: Uuid,
        by: Uuid,
        at: DateTime<Utc>,
        reason: String,
    },
    SetAdminActive {
        admin_id: Uuid,
        active: bool,
    },
}

impl SubjectMutation {
    /// The row this mutation writes to.
    pub fn target(&self) -> (SubjectKind, Uuid) {
        match self {
            SubjectMutation::SuspendUser { user_id, .. }
            | SubjectMutation::UnsuspendUser { user_id }
            | SubjectMutation::PromoteToCreator { user_id } => (SubjectKind::User, *user_id),
            SubjectMutation::ReviewApplication { application_id, .. } => {
                (SubjectKind::CreatorApplication, *application_id)
            }
            SubjectMutation::SetPostHidden { post_id, .. }
            | SubjectMutation::SoftDeletePost { post_id, .. } => (SubjectKind::Post, *post_id),
            SubjectMutation::SetCommentHidden { comment_id, .. }
            | SubjectMutation::SoftDeleteComment { comment_id, .. } => {
                (SubjectKind::Comment, *comment_id)
            }
            SubjectMutation::EndStream { stream_id, .. } => (SubjectKind::Stream, *stream_id),
            SubjectMutation::UpdateReport { report_id, .. } => (SubjectKind::Report, *report_id),
            SubjectMutation::RefundPayment { payment_id, .. } => {
                (SubjectKind::Payment, *payment_id)
            }
            SubjectMutation::SetAdminActive { admin_id, .. } => (SubjectKind::Admin, *admin_id),
        }
    }

    /// Applies the change to an in-memory subject.
    pub fn apply(&self, subject: &mut Subject) -> Result<(), DomainError> {
        match (self, subject) {
            (
                SubjectMutation::SuspendUser {
                    reason,
                    by,
                    at,
                    expires_at,
                    ..
                },
                Subject::User(user),
            ) => {
                user.is_suspended = true;
                user.suspended_reason = Some(reason.clone());
                user.suspended_by = Some(*by);
                user.suspended_at = Some(*at);
                user.suspension_expires_at = *expires_at;
            }
            (SubjectMutation::UnsuspendUser { .. }, Subject::User(user)) => {
                user.is_suspended = false;
                user.suspended_reason = None;
                user.suspended_by = None;
                user.suspended_at = None;
                user.suspension_expires_at = None;
            }
            (SubjectMutation::PromoteToCreator { .. }, Subject::User(user)) => {
                if user.role == UserRole::User {
                    user.role = UserRole::Creator;
                }
            }
            (
                SubjectMutation::ReviewApplication {
                    status,
                    by,
                    at,
                    note,
                    rejection_reason,
                    ..
                },
                Subject::CreatorApplication(application),
            ) => {
                application.status = *status;
                application.reviewed_by = Some(*by);
                application.reviewed_at = Some(*at);
                application.review_note = note.clone();
                application.rejection_reason = rejection_reason.clone();
            }
            (
                SubjectMutation::SetPostHidden {
                    hidden,
                    by,
                    at,
                    reason,
                    ..
                },
                Subject::Post(post),
            ) => {
                post.is_hidden = *hidden;
                if *hidden {
                    post.hidden_reason = reason.clone();
                    post.hidden_by = Some(*by);
                    post.hidden_at = Some(*at);
                } else {
                    post.hidden_reason = None;
                    post.hidden_by = None;
                    post.hidden_at = None;
                }
            }
            (SubjectMutation::SoftDeletePost { by, at, reason, .. }, Subject::Post(post)) => {
                post.deleted_at = Some(*at);
                post.deleted_by = Some(*by);
                post.deletion_reason = Some(reason.clone());
            }
            (
                SubjectMutation::SetCommentHidden {
                    hidden,
                    by,
                    at,
                    reason,
                    ..
                },
                Subject::Comment(comment),
            ) => {
                comment.is_hidden = *hidden;
                if *hidden {
                    comment.hidden_reason = reason.clone();
                    comment.hidden_by = Some(*by);
                    comment.hidden_at = Some(*at);
                } else {
                    comment.hidden_reason = None;
                    comment.hidden_by = None;
                    comment.hidden_at = None;
                }
            }
            (
                SubjectMutation::SoftDeleteComment { by, at, reason, .. },
                Subject::Comment(comment),
            ) => {
                comment.deleted_at = Some(*at);
                comment.deleted_by = Some(*by);
                comment.deletion_reason = Some(reason.clone());
            }
            (SubjectMutation::EndStream { by, at, reason, .. }, Subject::Stream(stream)) => {
                stream.is_live = false;
                stream.ended_at = Some(*at);
                stream.ended_by = Some(*by);
                stream.end_reason = Some(reason.clone());
            }
            (
                SubjectMutation::UpdateReport {
                    status,
                    by,
                    at,
                    resolution,
                    action_taken,
                    ..
                },
                Subject::Report(report),
            ) => {
                report.status = *status;
                report.reviewed_by = Some(*by);
                report.reviewed_at = Some(*at);
                if resolution.is_some() {
                    report.resolution = resolution.clone();
                }
                if action_taken.is_some() {
                    report.action_taken = action_taken.clone();
                }
            }
            (SubjectMutation::RefundPayment { by, at, reason, .. }, Subject::Payment(payment)) => {
                payment.status = PaymentStatus::Refunded;
                payment.failure_reason = Some(reason.clone());
                payment.refunded_by = Some(*by);
                payment.refunded_at = Some(*at);
            }
            (SubjectMutation::SetAdminActive { active, .. }, Subject::Admin(admin)) => {
                admin.is_active = *active;
            }
            (mutation, subject) => {
                return Err(DomainError::Internal(format!(
                    "Mutation {:?} does not apply to a {}",
                    mutation.target().0,
                    subject.kind()
                )));
            }
        }
        Ok(())
    }
}

/// One atomic unit of work against the subject store.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Loads and row-locks a subject. `None` when it does not exist.
    async fn lock_subject(
        &mut self,
        kind: SubjectKind,
        id: Uuid,
    ) -> Result<Option<Subject>, DomainError>;

    /// Loads and row-locks a user's coin wallet.
    async fn lock_wallet(&mut self, user_id: Uuid) -> Result<Option<Wallet>, DomainError>;

    /// Number of active accounts holding an admin role.
    async fn count_active_admins(&mut self) -> Result<i64, DomainError>;

    async fn apply(&mut self, mutation: &SubjectMutation) -> Result<(), DomainError>;

    /// Applies a signed balance change and records the ledger entry.
    async fn adjust_balance(&mut self, adjustment: &LedgerAdjustment)
        -> Result<Wallet, DomainError>;

    async fn append_audit(&mut self, record: &NewAuditRecord) -> Result<Uuid, DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// Source of units of work.
#[async_trait]
pub trait TransitionStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError>;
}
