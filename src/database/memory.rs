use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::directory::{DirectoryError, IdentityDirectory};
use super::models::{BusinessView, Company, PlatformUser};

/// In-memory directory for tests and database-less local runs
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<Uuid, PlatformUser>>>,
    companies: Arc<RwLock<HashMap<Uuid, Company>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: PlatformUser) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_company(&self, company: Company) {
        self.companies.write().await.insert(company.id, company);
    }
}

#[async_trait]
impl IdentityDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlatformUser>, DirectoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn active_businesses(&self) -> Result<Vec<BusinessView>, DirectoryError> {
        let companies = self.companies.read().await;
        let users = self.users.read().await;

        let mut businesses: Vec<BusinessView> = companies
            .values()
            .filter(|company| company.is_active)
            .map(|company| {
                let mut members: Vec<_> = users
                    .values()
                    .filter(|u| u.company_id == Some(company.id))
                    .filter(|u| u.is_verified() && !u.is_platform_admin())
                    .map(PlatformUser::snapshot)
                    .collect();
                members.sort_by(|a, b| a.name.cmp(&b.name));

                BusinessView {
                    id: company.id,
                    name: company.name.clone(),
                    users: members,
                }
            })
            .collect();

        businesses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(businesses)
    }
}
