//! Domain layer for the back-office service.
//!
//! This crate contains:
//! - Domain models for platform users, content, payments and the catalog
//! - The role-gated access policy
//! - The guarded state-transition engine and its storage seam
//! - Audit record construction and failure policy
//! - Analytics date ranges and time bucketing

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{DomainError, ErrorKind};
