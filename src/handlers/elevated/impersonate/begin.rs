// handlers/elevated/impersonate/begin.rs - POST /api/impersonate/:target_id

use axum::extract::{Extension, Path, State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::UserSnapshot;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BeginResponse {
    pub impersonation_token: String,
    pub api_token: String,
    pub target_user: UserSnapshot,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// Start impersonating `target_id` as the authenticated platform admin.
///
/// Returns 201 with the impersonation token (used to check status and revert)
/// and an API token scoped to the target user.
pub async fn impersonate_begin(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(target_id): Path<String>,
) -> ApiResult<BeginResponse> {
    let target_id = Uuid::parse_str(&target_id)
        .map_err(|_| ApiError::bad_request(format!("Invalid user id '{}'", target_id)))?;

    let issued = state
        .impersonation
        .begin(auth_user.user_id, target_id)
        .await?;

    let grant = issued.grant;
    let message = format!("Now impersonating {}", grant.target_user.name);

    Ok(ApiResponse::created(BeginResponse {
        impersonation_token: grant.token,
        api_token: issued.api_token,
        target_user: grant.target_user,
        expires_at: grant.expires_at,
        message,
    }))
}
