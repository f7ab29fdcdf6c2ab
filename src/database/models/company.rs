use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// An active company with the member accounts an operator may impersonate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessView {
    pub id: Uuid,
    pub name: String,
    pub users: Vec<UserSnapshot>,
}
