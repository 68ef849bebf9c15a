//! HTTP route handlers.

use serde::Deserialize;

pub mod admins;
pub mod analytics;
pub mod audit_logs;
pub mod auth;
pub mod catalog;
pub mod entities;
pub mod health;
pub mod transitions;
pub mod users;

/// `?page=&limit=` for endpoints without sorting or search.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
