//! Domain models for the back office.

pub mod actor;
pub mod analytics;
pub mod audit_log;
pub mod content;
pub mod creator_application;
pub mod discount_code;
pub mod gift;
pub mod listing;
pub mod patch;
pub mod payment;
pub mod report;
pub mod subject;
pub mod user;

pub use actor::{
    AccessLevel, Actor, AdminRole, AdminSummary, ChangeAdminRoleRequest, CreateAdminRequest,
    LoginRequest, LoginResponse,
};
pub use analytics::{
    AggregationResult, AnalyticsMetric, AnalyticsQuery, AnalyticsResult, DateRange, GroupBy,
    SeriesPoint,
};
pub use audit_log::{
    ActionCount, ActorActivity, AuditAction, AuditLogQuery, AuditRecord, AuditStats,
    AuditStatsQuery, NewAuditRecord,
};
pub use content::{Comment, CommentFilter, ContentStatus, Post, PostFilter, Stream, StreamFilter};
pub use creator_application::{ApplicationStatus, CreatorApplication, CreatorApplicationFilter};
pub use discount_code::{
    CreateDiscountCodeRequest, DiscountCode, DiscountCodeFilter, DiscountType, RedemptionStats,
    UpdateDiscountCodeRequest,
};
pub use gift::{
    CreateGiftRequest, Gift, GiftFilter, GiftTransaction, GiftTransactionFilter, UpdateGiftRequest,
};
pub use listing::{EntityFilter, EntityKind, ListParams, ListQuery, Page, SortOrder, SortSpec};
pub use payment::{
    LedgerAdjustment, LedgerEntry, Payment, PaymentFilter, PaymentStatus, Wallet,
};
pub use report::{Report, ReportFilter, ReportReason, ReportStatus};
pub use subject::{Subject, SubjectKind, SubjectStatus};
pub use user::{SuspensionDuration, UpdateUserNotesRequest, User, UserFilter, UserRole};
