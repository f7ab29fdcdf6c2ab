use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::JwtIssuer;
use crate::services::ImpersonationService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub impersonation: Arc<ImpersonationService>,
    /// Validates bearer tokens on protected routes
    pub issuer: Arc<JwtIssuer>,
    /// Absent when running against in-memory collaborators
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(impersonation: ImpersonationService, issuer: JwtIssuer, pool: Option<PgPool>) -> Self {
        Self {
            impersonation: Arc::new(impersonation),
            issuer: Arc::new(issuer),
            pool,
        }
    }
}
