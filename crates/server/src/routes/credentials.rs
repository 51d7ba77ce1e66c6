use axum::{extract::{rejection::JsonRejection, State}, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use service::credential::domain::{IssueResult, VerifyResult};

use crate::errors::ApiError;
use crate::routes::ServerState;

/// Body of `/issue` and `/verify`. `id` stays optional here so a missing
/// field reaches validation instead of failing deserialization.
#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub message: &'static str,
    pub worker: String,
    pub issued_at: DateTime<Utc>,
}

impl From<IssueResult> for IssueResponse {
    fn from(r: IssueResult) -> Self {
        Self { message: r.status.message(), worker: r.record.worker_id, issued_at: r.record.issued_at }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl From<VerifyResult> for VerifyResponse {
    fn from(r: VerifyResult) -> Self {
        match r {
            VerifyResult::Valid(rec) => Self { valid: true, worker: Some(rec.worker_id), issued_at: Some(rec.issued_at) },
            VerifyResult::Unknown => Self { valid: false, worker: None, issued_at: None },
        }
    }
}

#[utoipa::path(post, path = "/issue", tag = "credentials", request_body = crate::openapi::CredentialRequestDoc, responses((status = 200, description = "Issued or already issued", body = crate::openapi::IssueResponseDoc), (status = 400, description = "Missing or empty identifier"), (status = 500, description = "Persistence failed")))]
pub async fn issue(
    State(state): State<ServerState>,
    payload: Result<Json<CredentialRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let Json(req) = payload?;
    let result = state.credentials.issue(req.id.as_deref()).await?;
    Ok(Json(result.into()))
}

#[utoipa::path(post, path = "/verify", tag = "credentials", request_body = crate::openapi::CredentialRequestDoc, responses((status = 200, description = "Verification result", body = crate::openapi::VerifyResponseDoc), (status = 400, description = "Missing or empty identifier")))]
pub async fn verify(
    State(state): State<ServerState>,
    payload: Result<Json<CredentialRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(req) = payload?;
    let result = state.credentials.verify(req.id.as_deref()).await?;
    Ok(Json(result.into()))
}
