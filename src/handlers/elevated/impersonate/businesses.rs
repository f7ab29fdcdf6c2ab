// handlers/elevated/impersonate/businesses.rs - GET /api/impersonate/businesses

use axum::extract::{Extension, State};
use serde::Serialize;

use crate::database::models::BusinessView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BusinessesResponse {
    pub businesses: Vec<BusinessView>,
}

/// Active companies with the verified, non-admin accounts that can be impersonated
pub async fn impersonate_businesses(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<BusinessesResponse> {
    let businesses = state.impersonation.businesses(auth_user.user_id).await?;
    Ok(ApiResponse::success(BusinessesResponse { businesses }))
}
