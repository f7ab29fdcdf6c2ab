use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::{SessionStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    deadline: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

/// Process-local session store. Expired entries are dropped lazily on read
/// and in bulk by `purge_expired`.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            value,
            deadline: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();

        // Fast path: try read lock
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict, re-checking in case it was replaced meanwhile
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }

    async fn swap(&self, key: &str, value: String, ttl: Duration) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entry = Entry {
            value,
            deadline: now + ttl,
        };
        let previous = self.entries.write().await.insert(key.to_string(), entry);
        Ok(previous.filter(|e| e.is_live(now)).map(|e| e.value))
    }
}

/// Periodically purge expired entries until the returned handle is aborted
pub fn spawn_sweeper(store: MemorySessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                debug!("Purged {} expired session entries", purged);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let store = MemorySessionStore::new();
        store.put("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(!store.delete("nope").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_evicted_on_read() {
        let store = MemorySessionStore::new();
        store.put("k", "v".to_string(), Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.entries.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_of_expired_entry_reports_false() {
        let store = MemorySessionStore::new();
        store.put("k", "v".to_string(), Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let store = MemorySessionStore::new();
        store.put("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn swap_returns_only_live_previous_value() {
        let store = MemorySessionStore::new();
        let ttl = Duration::from_secs(5);

        assert_eq!(store.swap("k", "a".to_string(), ttl).await.unwrap(), None);
        assert_eq!(store.swap("k", "b".to_string(), ttl).await.unwrap().as_deref(), Some("a"));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.swap("k", "c".to_string(), ttl).await.unwrap(), None);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_dead_entries() {
        let store = MemorySessionStore::new();
        store.put("short", "a".to_string(), Duration::from_secs(1)).await.unwrap();
        store.put("long", "b".to_string(), Duration::from_secs(600)).await.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_in_background() {
        let store = MemorySessionStore::new();
        store.put("k", "v".to_string(), Duration::from_secs(1)).await.unwrap();

        let handle = spawn_sweeper(store.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(store.entries.read().await.is_empty());
        handle.abort();
    }
}
