//! Authenticated admin extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::Actor;

use crate::error::ApiError;
use crate::services::AuthenticatedAdmin;

/// The actor of the current request.
///
/// Only available on routes behind `require_admin` or `require_super_admin`;
/// elsewhere extraction fails with `Unauthenticated`.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub actor: Actor,
    pub session_fingerprint: String,
}

impl From<AuthenticatedAdmin> for AdminAuth {
    fn from(admin: AuthenticatedAdmin) -> Self {
        Self {
            actor: admin.actor,
            session_fingerprint: admin.session_fingerprint,
        }
    }
}

impl From<&AdminAuth> for AuthenticatedAdmin {
    fn from(auth: &AdminAuth) -> Self {
        Self {
            actor: auth.actor.clone(),
            session_fingerprint: auth.session_fingerprint.clone(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .map(Into::into)
            .ok_or_else(|| ApiError::Unauthenticated("Authentication required".to_string()))
    }
}
