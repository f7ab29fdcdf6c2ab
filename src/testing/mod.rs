use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditError, AuditSink, MemoryAuditSink};
use crate::auth::JwtIssuer;
use crate::config::ImpersonationConfig;
use crate::database::models::{Company, PlatformUser, UserRole};
use crate::database::MemoryDirectory;
use crate::services::ImpersonationService;
use crate::session::{MemorySessionStore, SessionStore, StoreError};

pub const TEST_SECRET: &str = "test-secret";

/// Service wired to in-memory collaborators, seeded with one company,
/// a platform admin, the company owner and a cashier
pub struct Fixture {
    pub directory: MemoryDirectory,
    pub store: MemorySessionStore,
    /// What the service actually talks to; wraps `store`
    pub backend: Arc<ScriptedStore>,
    pub audit: MemoryAuditSink,
    pub issuer: JwtIssuer,
    pub service: ImpersonationService,
    pub company: Company,
    pub admin: PlatformUser,
    pub owner: PlatformUser,
    pub cashier: PlatformUser,
}

/// Audit sink whose writes always fail
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn append(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Err(AuditError::Write("audit backend offline".to_string()))
    }
}

/// Session store wrapper that can yield before every call, like a networked
/// backend, and fail individual operations on demand
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemorySessionStore,
    pub yield_first: AtomicBool,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_swaps: AtomicBool,
}

impl ScriptedStore {
    pub fn wrap(inner: MemorySessionStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    async fn before(&self) {
        if self.yield_first.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    fn backend_down() -> StoreError {
        StoreError::Backend("session backend offline".to_string())
    }
}

#[async_trait]
impl SessionStore for ScriptedStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        self.before().await;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.put(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.before().await;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.before().await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.delete(key).await
    }

    async fn swap(&self, key: &str, value: String, ttl: Duration) -> Result<Option<String>, StoreError> {
        self.before().await;
        if self.fail_swaps.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.swap(key, value, ttl).await
    }
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(ImpersonationConfig::default(), None).await
    }

    pub async fn with_config(config: ImpersonationConfig) -> Self {
        Self::build(config, None).await
    }

    pub async fn with_audit(sink: Arc<dyn AuditSink>) -> Self {
        Self::build(ImpersonationConfig::default(), Some(sink)).await
    }

    async fn build(config: ImpersonationConfig, audit_override: Option<Arc<dyn AuditSink>>) -> Self {
        let directory = MemoryDirectory::new();
        let store = MemorySessionStore::new();
        let backend = Arc::new(ScriptedStore::wrap(store.clone()));
        let audit = MemoryAuditSink::new();
        let issuer = JwtIssuer::new(TEST_SECRET, chrono::Duration::hours(1));

        let company = Company {
            id: Uuid::new_v4(),
            name: "Corner Shop".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        directory.insert_company(company.clone()).await;

        let admin = user(UserRole::SuperAdmin, None, true);
        let owner = user(UserRole::Owner, Some(company.id), true);
        let cashier = user(UserRole::Cashier, Some(company.id), true);
        for u in [&admin, &owner, &cashier] {
            directory.insert_user(u.clone()).await;
        }

        let audit_sink: Arc<dyn AuditSink> = match audit_override {
            Some(sink) => sink,
            None => Arc::new(audit.clone()),
        };

        let service = ImpersonationService::new(
            Arc::new(directory.clone()),
            backend.clone(),
            audit_sink,
            Arc::new(issuer.clone()),
            config,
        );

        Self {
            directory,
            store,
            backend,
            audit,
            issuer,
            service,
            company,
            admin,
            owner,
            cashier,
        }
    }

    /// Add a member of the fixture company
    pub async fn add_user(&self, role: UserRole, verified: bool) -> PlatformUser {
        let u = user(role, Some(self.company.id), verified);
        self.directory.insert_user(u.clone()).await;
        u
    }
}

pub fn user(role: UserRole, company_id: Option<Uuid>, verified: bool) -> PlatformUser {
    let id = Uuid::new_v4();
    PlatformUser {
        id,
        name: format!("{} {}", role, &id.simple().to_string()[..6]),
        email: format!("{}@example.test", id.simple()),
        role,
        company_id,
        is_active: true,
        email_verified_at: verified.then(Utc::now),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IdentityDirectory;

    #[tokio::test]
    async fn fixture_seeds_directory() {
        let fx = Fixture::new().await;

        let admin = fx.directory.find_by_id(fx.admin.id).await.unwrap().unwrap();
        assert!(admin.is_platform_admin());
        assert!(fx.cashier.is_verified());
        assert!(!fx.add_user(UserRole::Manager, false).await.is_verified());
    }

    #[tokio::test]
    async fn inactive_companies_are_hidden() {
        let fx = Fixture::new().await;
        fx.directory
            .insert_company(Company {
                id: Uuid::new_v4(),
                name: "Closed Bakery".to_string(),
                is_active: false,
                created_at: Utc::now(),
            })
            .await;

        let businesses = fx.directory.active_businesses().await.unwrap();
        assert_eq!(businesses.len(), 1);
        assert_eq!(businesses[0].name, "Corner Shop");
    }
}
