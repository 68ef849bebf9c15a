//! Repository implementations for database operations.

pub mod analytics;
pub mod audit_log;
pub mod catalog;
pub mod filter;
pub mod listing;
pub mod transition_store;
pub mod users;

pub use analytics::AnalyticsRepository;
pub use audit_log::AuditLogRepository;
pub use catalog::{DiscountCodeRepository, GiftRepository};
pub use listing::{EntityRecord, ListingRepository};
pub use transition_store::PgTransitionStore;
pub use users::{AdminSessionRepository, NewAdmin, UserRepository};
