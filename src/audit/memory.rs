use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AuditEntry, AuditError, AuditSink};

#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in append order
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
