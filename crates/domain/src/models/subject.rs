//! Targets of administrative actions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::content::{Comment, ContentStatus, Post, Stream};
use super::creator_application::{ApplicationStatus, CreatorApplication};
use super::payment::{Payment, PaymentStatus};
use super::report::{Report, ReportStatus};
use super::user::User;

/// Kind of entity an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectKind {
    User,
    CreatorApplication,
    Post,
    Comment,
    Stream,
    Report,
    Payment,
    Admin,
    DiscountCode,
    Gift,
}

impl SubjectKind {
    /// Stable name stored in audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "USER",
            SubjectKind::CreatorApplication => "CREATOR_APPLICATION",
            SubjectKind::Post => "POST",
            SubjectKind::Comment => "COMMENT",
            SubjectKind::Stream => "STREAM",
            SubjectKind::Report => "REPORT",
            SubjectKind::Payment => "PAYMENT",
            SubjectKind::Admin => "ADMIN",
            SubjectKind::DiscountCode => "DISCOUNT_CODE",
            SubjectKind::Gift => "GIFT",
        }
    }

    /// URL path segment, e.g. `creator-applications`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            SubjectKind::User => "users",
            SubjectKind::CreatorApplication => "creator-applications",
            SubjectKind::Post => "posts",
            SubjectKind::Comment => "comments",
            SubjectKind::Stream => "streams",
            SubjectKind::Report => "reports",
            SubjectKind::Payment => "payments",
            SubjectKind::Admin => "admins",
            SubjectKind::DiscountCode => "discount-codes",
            SubjectKind::Gift => "gifts",
        }
    }

    /// Subjects stored as rows of the `users` table.
    pub fn is_account(&self) -> bool {
        matches!(self, SubjectKind::User | SubjectKind::Admin)
    }

    /// Capitalized noun for error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubjectKind::User => "User",
            SubjectKind::CreatorApplication => "Application",
            SubjectKind::Post => "Post",
            SubjectKind::Comment => "Comment",
            SubjectKind::Stream => "Stream",
            SubjectKind::Report => "Report",
            SubjectKind::Payment => "Payment",
            SubjectKind::Admin => "Admin",
            SubjectKind::DiscountCode => "Discount code",
            SubjectKind::Gift => "Gift",
        }
    }

    pub fn all() -> &'static [SubjectKind] {
        &[
            SubjectKind::User,
            SubjectKind::CreatorApplication,
            SubjectKind::Post,
            SubjectKind::Comment,
            SubjectKind::Stream,
            SubjectKind::Report,
            SubjectKind::Payment,
            SubjectKind::Admin,
            SubjectKind::DiscountCode,
            SubjectKind::Gift,
        ]
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.path_segment() == segment)
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = String;

    /// Accepts either the audit name (`CREATOR_APPLICATION`) or the path
    /// segment (`creator-applications`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path_segment(s)
            .or_else(|| {
                Self::all()
                    .iter()
                    .copied()
                    .find(|k| k.as_str().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| format!("Unknown subject kind: {}", s))
    }
}

/// Lifecycle status of any subject, unified across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectStatus {
    Active,
    Suspended,
    Inactive,
    Pending,
    Approved,
    Rejected,
    Visible,
    Hidden,
    Deleted,
    Live,
    Ended,
    UnderReview,
    Resolved,
    Dismissed,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        f.write_str(&s)
    }
}

impl From<ApplicationStatus> for SubjectStatus {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Pending => SubjectStatus::Pending,
            ApplicationStatus::Approved => SubjectStatus::Approved,
            ApplicationStatus::Rejected => SubjectStatus::Rejected,
        }
    }
}

impl From<ContentStatus> for SubjectStatus {
    fn from(status: ContentStatus) -> Self {
        match status {
            ContentStatus::Visible => SubjectStatus::Visible,
            ContentStatus::Hidden => SubjectStatus::Hidden,
            ContentStatus::Deleted => SubjectStatus::Deleted,
        }
    }
}

impl From<ReportStatus> for SubjectStatus {
    fn from(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Pending => SubjectStatus::Pending,
            ReportStatus::UnderReview => SubjectStatus::UnderReview,
            ReportStatus::Resolved => SubjectStatus::Resolved,
            ReportStatus::Dismissed => SubjectStatus::Dismissed,
        }
    }
}

impl From<PaymentStatus> for SubjectStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => SubjectStatus::Pending,
            PaymentStatus::Completed => SubjectStatus::Completed,
            PaymentStatus::Failed => SubjectStatus::Failed,
            PaymentStatus::Refunded => SubjectStatus::Refunded,
        }
    }
}

/// A loaded subject of a guarded transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Subject {
    User(User),
    CreatorApplication(CreatorApplication),
    Post(Post),
    Comment(Comment),
    Stream(Stream),
    Report(Report),
    Payment(Payment),
    Admin(User),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::User(_) => SubjectKind::User,
            Subject::CreatorApplication(_) => SubjectKind::CreatorApplication,
            Subject::Post(_) => SubjectKind::Post,
            Subject::Comment(_) => SubjectKind::Comment,
            Subject::Stream(_) => SubjectKind::Stream,
            Subject::Report(_) => SubjectKind::Report,
            Subject::Payment(_) => SubjectKind::Payment,
            Subject::Admin(_) => SubjectKind::Admin,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Subject::User(u) | Subject::Admin(u) => u.id,
            Subject::CreatorApplication(a) => a.id,
            Subject::Post(p) => p.id,
            Subject::Comment(c) => c.id,
            Subject::Stream(s) => s.id,
            Subject::Report(r) => r.id,
            Subject::Payment(p) => p.id,
        }
    }

    pub fn status(&self) -> SubjectStatus {
        match self {
            Subject::User(u) => {
                if u.is_suspended {
                    SubjectStatus::Suspended
                } else {
                    SubjectStatus::Active
                }
            }
            Subject::Admin(u) => {
                if u.is_active {
                    SubjectStatus::Active
                } else {
                    SubjectStatus::Inactive
                }
            }
            Subject::CreatorApplication(a) => a.status.into(),
            Subject::Post(p) => p.status().into(),
            Subject::Comment(c) => c.status().into(),
            Subject::Stream(s) => {
                if s.is_live {
                    SubjectStatus::Live
                } else {
                    SubjectStatus::Ended
                }
            }
            Subject::Report(r) => r.status.into(),
            Subject::Payment(p) => p.status.into(),
        }
    }

    /// The platform user most directly affected by an action on this subject.
    pub fn affected_user_id(&self) -> Option<Uuid> {
        match self {
            Subject::User(u) | Subject::Admin(u) => Some(u.id),
            Subject::CreatorApplication(a) => Some(a.user_id),
            Subject::Post(p) => Some(p.author_id),
            Subject::Comment(c) => Some(c.author_id),
            Subject::Stream(s) => Some(s.user_id),
            Subject::Report(r) => r.reported_user_id,
            Subject::Payment(p) => Some(p.user_id),
        }
    }
}
