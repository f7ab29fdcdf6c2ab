// handlers/protected/impersonate/revert.rs - POST /api/impersonate/revert

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::database::models::UserSnapshot;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ImpersonationError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub impersonation_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevertResponse {
    pub message: String,
    pub original_user: UserSnapshot,
}

/// End an impersonation grant.
///
/// Unknown and expired tokens both answer 400, matching the documented contract.
pub async fn impersonate_revert(
    State(state): State<AppState>,
    payload: Option<Json<RevertRequest>>,
) -> ApiResult<RevertResponse> {
    let token = payload
        .and_then(|Json(body)| body.impersonation_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field("impersonation_token"))?;

    let grant = state
        .impersonation
        .revert(&token)
        .await
        .map_err(|e| match e {
            ImpersonationError::NotFound(msg) => ApiError::bad_request(msg),
            other => other.into(),
        })?;

    Ok(ApiResponse::success(RevertResponse {
        message: format!("Stopped impersonating {}", grant.target_user.name),
        original_user: grant.original_user,
    }))
}
