//! Custom Axum extractors.

pub mod admin_auth;
pub mod request;

pub use admin_auth::AdminAuth;
pub use request::{ApiPath, ApiQuery, ValidatedJson};
