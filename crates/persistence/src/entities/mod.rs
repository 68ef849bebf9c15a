//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Each `*_COLUMNS` constant is
//! the select list matching its entity, written against the table alias used by
//! the listing queries.

pub mod audit_log;
pub mod content;
pub mod creator_application;
pub mod discount_code;
pub mod enums;
pub mod gift;
pub mod payment;
pub mod report;
pub mod user;

pub use audit_log::{ActionCountEntity, ActorActivityEntity, AuditLogEntity, AUDIT_COLUMNS};
pub use content::{
    CommentEntity, PostEntity, StreamEntity, COMMENT_COLUMNS, POST_COLUMNS, STREAM_COLUMNS,
};
pub use creator_application::{CreatorApplicationEntity, APPLICATION_COLUMNS};
pub use discount_code::{DiscountCodeEntity, RedemptionStatsEntity, DISCOUNT_CODE_COLUMNS};
pub use enums::{
    ApplicationStatusDb, DiscountTypeDb, PaymentStatusDb, ReportReasonDb, ReportStatusDb,
    UserRoleDb,
};
pub use gift::{GiftEntity, GiftTransactionEntity, GIFT_COLUMNS, GIFT_TRANSACTION_COLUMNS};
pub use payment::{LedgerEntryEntity, PaymentEntity, WalletEntity, PAYMENT_COLUMNS};
pub use report::{ReportEntity, REPORT_COLUMNS};
pub use user::{AdminSessionEntity, CredentialsEntity, UserEntity, USER_COLUMNS};
