//! Guarded state transitions.
//!
//! Every administrative status change goes through [`TransitionEngine::apply`]:
//! role check, row lock, precondition, actor guard, parameter validation, then
//! mutation, ledger adjustment (refunds) and exactly one audit record inside a
//! single unit of work.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use shared::validation::{validate_note, validate_reason, MIN_REASON_LEN};
use std::sync::Arc;
use uuid::Uuid;

use super::access::authorize;
use super::audit::AuditRecordBuilder;
use super::store::{SubjectMutation, TransitionStore, UnitOfWork};
use crate::errors::DomainError;
use crate::models::{
    AccessLevel, Actor, ApplicationStatus, AuditAction, LedgerAdjustment, ReportStatus, Subject,
    SubjectKind, SubjectStatus, SuspensionDuration, UserRole, Wallet,
};

use SubjectStatus as S;

/// Maximum length of a free-text "action taken" on report resolution.
pub const MAX_ACTION_LEN: usize = 200;

/// Every supported transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    SuspendUser,
    UnsuspendUser,
    ApproveApplication,
    RejectApplication,
    HidePost,
    UnhidePost,
    DeletePost,
    HideComment,
    UnhideComment,
    DeleteComment,
    EndStream,
    ReviewReport,
    ResolveReport,
    DismissReport,
    RefundPayment,
    DeactivateAdmin,
    ReactivateAdmin,
}

/// Which free-text parameter a transition requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredText {
    Nothing,
    Reason,
    Resolution,
}

/// Static description of one transition.
#[derive(Debug)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    pub subject_kind: SubjectKind,
    /// Path verb, e.g. `suspend`.
    pub verb: &'static str,
    /// Past participle used in messages, e.g. `suspended`.
    pub past: &'static str,
    pub from: &'static [SubjectStatus],
    pub to: SubjectStatus,
    pub required: RequiredText,
    pub level: AccessLevel,
    pub action: AuditAction,
}

const TRANSITIONS: &[TransitionSpec] = &[
    TransitionSpec {
        kind: TransitionKind::SuspendUser,
        subject_kind: SubjectKind::User,
        verb: "suspend",
        past: "suspended",
        from: &[S::Active],
        to: S::Suspended,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::UserSuspended,
    },
    TransitionSpec {
        kind: TransitionKind::UnsuspendUser,
        subject_kind: SubjectKind::User,
        verb: "unsuspend",
        past: "unsuspended",
        from: &[S::Suspended],
        to: S::Active,
        required: RequiredText::Nothing,
        level: AccessLevel::Admin,
        action: AuditAction::UserUnsuspended,
    },
    TransitionSpec {
        kind: TransitionKind::ApproveApplication,
        subject_kind: SubjectKind::CreatorApplication,
        verb: "approve",
        past: "approved",
        from: &[S::Pending],
        to: S::Approved,
        required: RequiredText::Nothing,
        level: AccessLevel::Admin,
        action: AuditAction::CreatorApproved,
    },
    TransitionSpec {
        kind: TransitionKind::RejectApplication,
        subject_kind: SubjectKind::CreatorApplication,
        verb: "reject",
        past: "rejected",
        from: &[S::Pending],
        to: S::Rejected,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::CreatorRejected,
    },
    TransitionSpec {
        kind: TransitionKind::HidePost,
        subject_kind: SubjectKind::Post,
        verb: "hide",
        past: "hidden",
        from: &[S::Visible],
        to: S::Hidden,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::PostHidden,
    },
    TransitionSpec {
        kind: TransitionKind::UnhidePost,
        subject_kind: SubjectKind::Post,
        verb: "unhide",
        past: "unhidden",
        from: &[S::Hidden],
        to: S::Visible,
        required: RequiredText::Nothing,
        level: AccessLevel::Admin,
        action: AuditAction::PostUnhidden,
    },
    TransitionSpec {
        kind: TransitionKind::DeletePost,
        subject_kind: SubjectKind::Post,
        verb: "delete",
        past: "deleted",
        from: &[S::Visible, S::Hidden],
        to: S::Deleted,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::PostDeleted,
    },
    TransitionSpec {
        kind: TransitionKind::HideComment,
        subject_kind: SubjectKind::Comment,
        verb: "hide",
        past: "hidden",
        from: &[S::Visible],
        to: S::Hidden,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::CommentHidden,
    },
    TransitionSpec {
        kind: TransitionKind::UnhideComment,
        subject_kind: SubjectKind::Comment,
        verb: "unhide",
        past: "unhidden",
        from: &[S::Hidden],
        to: S::Visible,
        required: RequiredText::Nothing,
        level: AccessLevel::Admin,
        action: AuditAction::CommentUnhidden,
    },
    TransitionSpec {
        kind: TransitionKind::DeleteComment,
        subject_kind: SubjectKind::Comment,
        verb: "delete",
        past: "deleted",
        from: &[S::Visible, S::Hidden],
        to: S::Deleted,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::CommentDeleted,
    },
    TransitionSpec {
        kind: TransitionKind::EndStream,
        subject_kind: SubjectKind::Stream,
        verb: "end",
        past: "ended",
        from: &[S::Live],
        to: S::Ended,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::StreamEnded,
    },
    TransitionSpec {
        kind: TransitionKind::ReviewReport,
        subject_kind: SubjectKind::Report,
        verb: "review",
        past: "under review",
        from: &[S::Pending],
        to: S::UnderReview,
        required: RequiredText::Nothing,
        level: AccessLevel::Admin,
        action: AuditAction::ReportReviewed,
    },
    TransitionSpec {
        kind: TransitionKind::ResolveReport,
        subject_kind: SubjectKind::Report,
        verb: "resolve",
        past: "resolved",
        from: &[S::Pending, S::UnderReview],
        to: S::Resolved,
        required: RequiredText::Resolution,
        level: AccessLevel::Admin,
        action: AuditAction::ReportResolved,
    },
    TransitionSpec {
        kind: TransitionKind::DismissReport,
        subject_kind: SubjectKind::Report,
        verb: "dismiss",
        past: "dismissed",
        from: &[S::Pending, S::UnderReview],
        to: S::Dismissed,
        required: RequiredText::Reason,
        level: AccessLevel::Admin,
        action: AuditAction::ReportDismissed,
    },
    TransitionSpec {
        kind: TransitionKind::RefundPayment,
        subject_kind: SubjectKind::Payment,
        verb: "refund",
        past: "refunded",
        from: &[S::Completed],
        to: S::Refunded,
        required: RequiredText::Reason,
        level: AccessLevel::SuperAdmin,
        action: AuditAction::PaymentRefunded,
    },
    TransitionSpec {
        kind: TransitionKind::DeactivateAdmin,
        subject_kind: SubjectKind::Admin,
        verb: "deactivate",
        past: "deactivated",
        from: &[S::Active],
        to: S::Inactive,
        required: RequiredText::Reason,
        level: AccessLevel::SuperAdmin,
        action: AuditAction::AdminDeactivated,
    },
    TransitionSpec {
        kind: TransitionKind::ReactivateAdmin,
        subject_kind: SubjectKind::Admin,
        verb: "reactivate",
        past: "reactivated",
        from: &[S::Inactive],
        to: S::Active,
        required: RequiredText::Nothing,
        level: AccessLevel::SuperAdmin,
        action: AuditAction::AdminReactivated,
    },
];

impl TransitionKind {
    /// Looks up a transition by subject kind and path verb.
    pub fn resolve(subject_kind: SubjectKind, verb: &str) -> Result<Self, DomainError> {
        TRANSITIONS
            .iter()
            .find(|spec| spec.subject_kind == subject_kind && spec.verb == verb)
            .map(|spec| spec.kind)
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "Unknown transition '{}' for {}",
                    verb,
                    subject_kind.path_segment()
                ))
            })
    }

    /// `TRANSITIONS` is declared in variant order.
    pub fn spec(&self) -> &'static TransitionSpec {
        &TRANSITIONS[*self as usize]
    }

    pub fn all() -> impl Iterator<Item = TransitionKind> {
        TRANSITIONS.iter().map(|spec| spec.kind)
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spec = self.spec();
        write!(f, "{}.{}", spec.subject_kind.path_segment(), spec.verb)
    }
}

impl TransitionSpec {
    fn precondition_message(&self, current: SubjectStatus) -> String {
        let name = self.subject_kind.display_name();
        if current == self.to {
            format!("{} is already {}", name, self.past)
        } else {
            format!("{} cannot be {} from status {}", name, self.past, current)
        }
    }
}

/// Request body of a transition call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionParams {
    pub reason: Option<String>,
    pub note: Option<String>,
    pub duration: Option<SuspensionDuration>,
    pub expires_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub action: Option<String>,
}

/// Parameters after validation against a transition's contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParams {
    pub reason: Option<String>,
    pub note: Option<String>,
    pub duration: Option<SuspensionDuration>,
    pub expires_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub action_taken: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn validation_message(err: validator::ValidationError) -> DomainError {
    DomainError::InvalidInput(
        err.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string()),
    )
}

/// Checks `params` against the required-field contract of `spec`.
pub fn validate_params(
    spec: &TransitionSpec,
    params: &TransitionParams,
    now: DateTime<Utc>,
) -> Result<ValidatedParams, DomainError> {
    let mut validated = ValidatedParams {
        note: non_blank(&params.note),
        ..Default::default()
    };
    if let Some(note) = &validated.note {
        validate_note(note).map_err(validation_message)?;
    }

    match spec.required {
        RequiredText::Reason => {
            let reason = non_blank(&params.reason)
                .ok_or_else(|| DomainError::InvalidInput("Reason is required".to_string()))?;
            validate_reason(&reason).map_err(validation_message)?;
            validated.reason = Some(reason);
        }
        RequiredText::Resolution => {
            let resolution = non_blank(&params.resolution).ok_or_else(|| {
                DomainError::InvalidInput("Resolution is required".to_string())
            })?;
            if resolution.chars().count() < MIN_REASON_LEN {
                return Err(DomainError::InvalidInput(format!(
                    "Resolution must be at least {} characters",
                    MIN_REASON_LEN
                )));
            }
            validated.resolution = Some(resolution);
            validated.action_taken = non_blank(&params.action);
            if let Some(action) = &validated.action_taken {
                if action.chars().count() > MAX_ACTION_LEN {
                    return Err(DomainError::InvalidInput(format!(
                        "Action must not exceed {} characters",
                        MAX_ACTION_LEN
                    )));
                }
            }
        }
        RequiredText::Nothing => {}
    }

    if spec.kind == TransitionKind::SuspendUser {
        let duration = params.duration.unwrap_or(if params.expires_at.is_some() {
            SuspensionDuration::Temporary
        } else {
            SuspensionDuration::Permanent
        });
        match (duration, params.expires_at) {
            (SuspensionDuration::Temporary, None) => {
                return Err(DomainError::InvalidInput(
                    "expiresAt is required for a temporary suspension".to_string(),
                ));
            }
            (SuspensionDuration::Temporary, Some(expires_at)) if expires_at <= now => {
                return Err(DomainError::InvalidInput(
                    "expiresAt must be in the future".to_string(),
                ));
            }
            (SuspensionDuration::Permanent, Some(_)) => {
                return Err(DomainError::InvalidInput(
                    "expiresAt is only allowed for a temporary suspension".to_string(),
                ));
            }
            _ => {}
        }
        validated.duration = Some(duration);
        validated.expires_at = params.expires_at;
    }

    Ok(validated)
}

/// Actor-specific guards. Runs after the precondition.
fn check_guard(spec: &TransitionSpec, actor: &Actor, subject: &Subject) -> Result<(), DomainError> {
    match (spec.kind, subject) {
        (TransitionKind::SuspendUser, Subject::User(user)) if user.id == actor.id => Err(
            DomainError::Forbidden("You cannot suspend your own account".to_string()),
        ),
        (TransitionKind::SuspendUser | TransitionKind::UnsuspendUser, Subject::User(user))
            if user.role == UserRole::SuperAdmin && !actor.is_super_admin() =>
        {
            Err(DomainError::Forbidden(format!(
                "Only a SUPER_ADMIN can {} a SUPER_ADMIN account",
                spec.verb
            )))
        }
        (TransitionKind::DeactivateAdmin, Subject::Admin(admin)) if admin.id == actor.id => Err(
            DomainError::Forbidden("You cannot deactivate your own account".to_string()),
        ),
        _ => Ok(()),
    }
}

fn subject_label(subject: &Subject) -> String {
    match subject {
        Subject::User(user) | Subject::Admin(user) => user.email.clone(),
        Subject::Stream(stream) => format!("'{}'", stream.title),
        Subject::Payment(payment) => payment.order_id.clone(),
        other => other.id().to_string(),
    }
}

/// A validated transition call.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub kind: TransitionKind,
    pub subject_id: Uuid,
    pub params: TransitionParams,
}

/// Result of a committed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub subject: Subject,
    pub previous_status: SubjectStatus,
    pub audit_id: Uuid,
    pub wallet: Option<Wallet>,
}

/// Everything a transition writes, computed before any write happens.
struct Plan {
    mutations: Vec<SubjectMutation>,
    ledger: Option<LedgerAdjustment>,
    meta: Map<String, JsonValue>,
}

/// Applies guarded transitions against a [`TransitionStore`].
#[derive(Clone)]
pub struct TransitionEngine {
    store: Arc<dyn TransitionStore>,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn TransitionStore>) -> Self {
        Self { store }
    }

    /// Runs one transition to completion or not at all.
    pub async fn apply(
        &self,
        actor: &Actor,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, DomainError> {
        let spec = request.kind.spec();
        authorize(Some(actor), spec.level)?;

        let now = Utc::now();
        let mut uow = self.store.begin().await?;

        // Rows of the users table are locked in id order.
        let (current, subject) =
            if spec.subject_kind.is_account() && request.subject_id < actor.id {
                let subject = lock_target(uow.as_mut(), spec, request.subject_id).await?;
                (lock_actor(uow.as_mut(), actor, spec.level).await?, subject)
            } else {
                let current = lock_actor(uow.as_mut(), actor, spec.level).await?;
                (current, lock_target(uow.as_mut(), spec, request.subject_id).await?)
            };
        let actor = &current;

        let previous_status = subject.status();
        if !spec.from.contains(&previous_status) {
            return Err(DomainError::InvalidState(
                spec.precondition_message(previous_status),
            ));
        }

        check_guard(spec, actor, &subject)?;
        let params = validate_params(spec, &request.params, now)?;
        let plan = plan(spec, actor, &subject, &params, now, uow.as_mut()).await?;

        for mutation in &plan.mutations {
            uow.apply(mutation).await?;
        }
        let wallet = match &plan.ledger {
            Some(adjustment) => Some(uow.adjust_balance(adjustment).await?),
            None => None,
        };

        let updated = uow
            .lock_subject(spec.subject_kind, request.subject_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(format!(
                    "{} disappeared during transition",
                    spec.subject_kind.display_name()
                ))
            })?;

        let mut audit = AuditRecordBuilder::user_action(actor.id, spec.action)
            .on_subject(spec.subject_kind, subject.id())
            .affecting(subject.affected_user_id())
            .describe(format!(
                "{} {} {}",
                spec.subject_kind.display_name(),
                subject_label(&subject),
                spec.past
            ))
            .with_meta("reason", &params.reason)
            .with_meta("note", &params.note)
            .with_meta("previousStatus", previous_status)
            .with_meta("newStatus", updated.status());
        for (key, value) in plan.meta {
            audit = audit.with_meta(&key, value);
        }
        if let Some(wallet) = &wallet {
            audit = audit.with_meta("balanceAfter", wallet.balance);
        }
        let audit_id = uow.append_audit(&audit.build()).await?;

        uow.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            subject_kind = %spec.subject_kind,
            subject_id = %request.subject_id,
            transition = %spec.kind,
            "Transition applied"
        );

        Ok(TransitionOutcome {
            subject: updated,
            previous_status,
            audit_id,
            wallet,
        })
    }
}

/// Re-reads the acting admin under lock. A deactivation, suspension or
/// demotion committed since the request was authenticated applies here.
async fn lock_actor(
    uow: &mut dyn UnitOfWork,
    actor: &Actor,
    level: AccessLevel,
) -> Result<Actor, DomainError> {
    let current = match uow.lock_subject(SubjectKind::Admin, actor.id).await? {
        Some(Subject::Admin(user)) if !user.is_suspended => Actor::from_user(&user),
        _ => None,
    }
    .ok_or_else(|| {
        DomainError::Unauthenticated("Account is no longer an administrator".to_string())
    })?;
    authorize(Some(&current), level)?;
    Ok(current)
}

async fn lock_target(
    uow: &mut dyn UnitOfWork,
    spec: &TransitionSpec,
    subject_id: Uuid,
) -> Result<Subject, DomainError> {
    uow.lock_subject(spec.subject_kind, subject_id)
        .await?
        .ok_or_else(|| {
            DomainError::NotFound(format!("{} not found", spec.subject_kind.display_name()))
        })
}

/// Builds the writes for `spec`. May take further locks (owning user, wallet)
/// and fail with `InvalidState` on cross-row invariants.
async fn plan(
    spec: &TransitionSpec,
    actor: &Actor,
    subject: &Subject,
    params: &ValidatedParams,
    now: DateTime<Utc>,
    uow: &mut dyn UnitOfWork,
) -> Result<Plan, DomainError> {
    let by = actor.id;
    let id = subject.id();
    let reason = params.reason.clone().unwrap_or_default();
    let mut meta = Map::new();
    let mut ledger = None;

    let mutations = match (spec.kind, subject) {
        (TransitionKind::SuspendUser, _) => {
            if let Some(duration) = params.duration {
                meta.insert("duration".into(), serde_json::to_value(duration).unwrap_or_default());
            }
            if let Some(expires_at) = params.expires_at {
                meta.insert("expiresAt".into(), JsonValue::String(expires_at.to_rfc3339()));
            }
            vec![SubjectMutation::SuspendUser {
                user_id: id,
                reason,
                by,
                at: now,
                expires_at: params.expires_at,
            }]
        }
        (TransitionKind::UnsuspendUser, _) => vec![SubjectMutation::UnsuspendUser { user_id: id }],
        (TransitionKind::ApproveApplication, Subject::CreatorApplication(application)) => {
            let owner = uow
                .lock_subject(SubjectKind::User, application.user_id)
                .await?
                .ok_or_else(|| DomainError::NotFound("Applicant not found".to_string()))?;
            let promote = matches!(&owner, Subject::User(user) if user.role == UserRole::User);

            meta.insert("userId".into(), JsonValue::String(application.user_id.to_string()));
            meta.insert("promoted".into(), JsonValue::Bool(promote));

            let mut mutations = vec![SubjectMutation::ReviewApplication {
                application_id: id,
                status: ApplicationStatus::Approved,
                by,
                at: now,
                note: params.note.clone(),
                rejection_reason: None,
            }];
            if promote {
                mutations.push(SubjectMutation::PromoteToCreator {
                    user_id: application.user_id,
                });
            }
            mutations
        }
        (TransitionKind::RejectApplication, Subject::CreatorApplication(application)) => {
            meta.insert("userId".into(), JsonValue::String(application.user_id.to_string()));
            vec![SubjectMutation::ReviewApplication {
                application_id: id,
                status: ApplicationStatus::Rejected,
                by,
                at: now,
                note: params.note.clone(),
                rejection_reason: Some(reason),
            }]
        }
        (TransitionKind::HidePost, _) => vec![SubjectMutation::SetPostHidden {
            post_id: id,
            hidden: true,
            by,
            at: now,
            reason: Some(reason),
        }],
        (TransitionKind::UnhidePost, _) => vec![SubjectMutation::SetPostHidden {
            post_id: id,
            hidden: false,
            by,
            at: now,
            reason: None,
        }],
        (TransitionKind::DeletePost, _) => vec![SubjectMutation::SoftDeletePost {
            post_id: id,
            by,
            at: now,
            reason,
        }],
        (TransitionKind::HideComment, _) => vec![SubjectMutation::SetCommentHidden {
            comment_id: id,
            hidden: true,
            by,
            at: now,
            reason: Some(reason),
        }],
        (TransitionKind::UnhideComment, _) => vec![SubjectMutation::SetCommentHidden {
            comment_id: id,
            hidden: false,
            by,
            at: now,
            reason: None,
        }],
        (TransitionKind::DeleteComment, _) => vec![SubjectMutation::SoftDeleteComment {
            comment_id: id,
            by,
            at: now,
            reason,
        }],
        (TransitionKind::EndStream, Subject::Stream(stream)) => {
            meta.insert("title".into(), JsonValue::String(stream.title.clone()));
            vec![SubjectMutation::EndStream {
                stream_id: id,
                by,
                at: now,
                reason,
            }]
        }
        (TransitionKind::ReviewReport, _) => vec![SubjectMutation::UpdateReport {
            report_id: id,
            status: ReportStatus::UnderReview,
            by,
            at: now,
            resolution: None,
            action_taken: None,
        }],
        (TransitionKind::ResolveReport, _) => {
            if let Some(resolution) = &params.resolution {
                meta.insert("resolution".into(), JsonValue::String(resolution.clone()));
            }
            if let Some(action) = &params.action_taken {
                meta.insert("action".into(), JsonValue::String(action.clone()));
            }
            vec![SubjectMutation::UpdateReport {
                report_id: id,
                status: ReportStatus::Resolved,
                by,
                at: now,
                resolution: params.resolution.clone(),
                action_taken: params.action_taken.clone(),
            }]
        }
        (TransitionKind::DismissReport, _) => {
            meta.insert("resolution".into(), JsonValue::String(reason.clone()));
            vec![SubjectMutation::UpdateReport {
                report_id: id,
                status: ReportStatus::Dismissed,
                by,
                at: now,
                resolution: Some(reason),
                action_taken: None,
            }]
        }
        (TransitionKind::RefundPayment, Subject::Payment(payment)) => {
            let credited = payment.credited_coins();
            let balance = uow
                .lock_wallet(payment.user_id)
                .await?
                .map(|wallet| wallet.balance)
                .unwrap_or(0);
            if balance < credited {
                return Err(DomainError::InvalidState(format!(
                    "Insufficient wallet balance for refund: balance {}, required {}",
                    balance, credited
                )));
            }

            meta.insert("orderId".into(), JsonValue::String(payment.order_id.clone()));
            meta.insert("amount".into(), JsonValue::from(payment.amount));
            meta.insert("currency".into(), JsonValue::String(payment.currency.clone()));
            meta.insert("coins".into(), JsonValue::from(credited));

            ledger = Some(LedgerAdjustment {
                user_id: payment.user_id,
                payment_id: payment.id,
                delta: -credited,
                reason: reason.clone(),
            });
            vec![SubjectMutation::RefundPayment {
                payment_id: id,
                by,
                at: now,
                reason,
            }]
        }
        (TransitionKind::DeactivateAdmin, _) => {
            if uow.count_active_admins().await? <= 1 {
                return Err(DomainError::InvalidState(
                    "Cannot deactivate the last active admin".to_string(),
                ));
            }
            vec![SubjectMutation::SetAdminActive {
                admin_id: id,
                active: false,
            }]
        }
        (TransitionKind::ReactivateAdmin, _) => vec![SubjectMutation::SetAdminActive {
            admin_id: id,
            active: true,
        }],
        (kind, other) => {
            return Err(DomainError::Internal(format!(
                "Transition {} cannot target a {}",
                kind,
                other.kind()
            )));
        }
    };

    Ok(Plan {
        mutations,
        ledger,
        meta,
    })
}
