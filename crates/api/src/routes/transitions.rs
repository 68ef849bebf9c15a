//! Guarded transition endpoint.
//!
//! `POST /api/v1/transitions/:subject_kind/:subject_id/:transition` resolves
//! the transition from the path and hands it to the engine. The body is
//! optional; an empty body means no parameters.

use axum::{body::Bytes, extract::State, Json};
use domain::errors::DomainError;
use domain::models::{Subject, SubjectKind, SubjectStatus, Wallet};
use domain::services::{TransitionKind, TransitionOutcome, TransitionParams, TransitionRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, ApiPath};
use crate::middleware::record_transition;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionMeta {
    pub transition: String,
    pub previous_status: SubjectStatus,
    pub audit_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<Wallet>,
}

/// `{"success": true, "data": <subject>, "meta": {...}}`
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub data: Subject,
    pub meta: TransitionMeta,
}

impl TransitionResponse {
    fn new(kind: TransitionKind, outcome: TransitionOutcome) -> Self {
        Self {
            success: true,
            data: outcome.subject,
            meta: TransitionMeta {
                transition: kind.to_string(),
                previous_status: outcome.previous_status,
                audit_id: outcome.audit_id,
                wallet: outcome.wallet,
            },
        }
    }
}

fn resolve_kind(subject_kind: &str, verb: &str) -> Result<TransitionKind, DomainError> {
    let subject_kind = SubjectKind::from_path_segment(subject_kind)
        .ok_or_else(|| DomainError::NotFound(format!("Unknown subject kind: {}", subject_kind)))?;
    TransitionKind::resolve(subject_kind, verb)
}

fn parse_params(body: &[u8]) -> Result<TransitionParams, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TransitionParams::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid request body: {}", e)))
}

pub async fn apply_transition(
    State(state): State<AppState>,
    auth: AdminAuth,
    ApiPath((subject_kind, subject_id, verb)): ApiPath<(String, Uuid, String)>,
    body: Bytes,
) -> Result<Json<TransitionResponse>, ApiError> {
    let kind = resolve_kind(&subject_kind, &verb)?;
    let params = parse_params(&body)?;
    let label = kind.to_string();

    let request = TransitionRequest {
        kind,
        subject_id,
        params,
    };
    match state.engine.apply(&auth.actor, request).await {
        Ok(outcome) => {
            record_transition(&label, "success");
            Ok(Json(TransitionResponse::new(kind, outcome)))
        }
        Err(e) => {
            record_transition(&label, e.kind().as_str());
            tracing::debug!(
                actor_id = %auth.actor.id,
                %subject_id,
                transition = %label,
                error = %e,
                "Transition rejected"
            );
            Err(e.into())
        }
    }
}
