//! Persistence layer for the back-office service.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the Postgres transition store
//! - Error classification and the read retry helper

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod retry;

pub use error::StoreError;
