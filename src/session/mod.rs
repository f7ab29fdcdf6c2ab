//! Ephemeral key-value storage for impersonation grants.
//!
//! Values are opaque strings (the service stores JSON) and every entry carries
//! its own time-to-live. Backends decide how eagerly they evict; readers must
//! not assume an expired entry is already gone.

pub mod memory;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory::{spawn_sweeper, MemorySessionStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch a live entry
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove an entry. Returns true when a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically store `value` under `key` and return the live entry it replaced
    async fn swap(&self, key: &str, value: String, ttl: Duration) -> Result<Option<String>, StoreError>;
}
