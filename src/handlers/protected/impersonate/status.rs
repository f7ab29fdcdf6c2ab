// handlers/protected/impersonate/status.rs - GET /api/impersonate/status

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ImpersonationStatus;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub impersonation_token: Option<String>,
}

pub async fn impersonate_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<ImpersonationStatus> {
    let status = state
        .impersonation
        .status(query.impersonation_token.as_deref())
        .await?;
    Ok(ApiResponse::success(status))
}
