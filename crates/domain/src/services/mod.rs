//! Domain services for the back office.
//!
//! Services contain business logic that operates on domain models.

pub mod access;
pub mod analytics;
pub mod audit;
pub mod memory_store;
pub mod store;
pub mod transition;

pub use access::authorize;
pub use analytics::{bucket_series, bucket_start};
pub use audit::{audit_helpers, AuditFailureMode, AuditRecordBuilder};
pub use memory_store::InMemoryStore;
pub use store::{SubjectMutation, TransitionStore, UnitOfWork};
pub use transition::{
    TransitionEngine, TransitionKind, TransitionOutcome, TransitionParams, TransitionRequest,
};
