use async_trait::async_trait;
use sqlx::PgPool;

use super::{AuditEntry, AuditError, AuditSink};

/// Writes audit entries to the `audit_logs` table
#[derive(Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, action, actor_id, target_type, target_id, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.action.as_str())
        .bind(entry.actor_id)
        .bind(&entry.target_type)
        .bind(entry.target_id)
        .bind(&entry.note)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
