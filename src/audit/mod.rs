//! Append-only trail of administrative actions.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryAuditSink;
pub use postgres::PgAuditSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ImpersonationStarted,
    ImpersonationEnded,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ImpersonationStarted => "impersonation_started",
            AuditAction::ImpersonationEnded => "impersonation_ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub actor_id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        actor_id: Uuid,
        target_type: impl Into<String>,
        target_id: Uuid,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            actor_id,
            target_type: target_type.into(),
            target_id,
            timestamp: Utc::now(),
            note,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit write failed: {0}")]
    Write(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_match_serde() {
        for action in [AuditAction::ImpersonationStarted, AuditAction::ImpersonationEnded] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, serde_json::json!(action.as_str()));
        }
    }
}
