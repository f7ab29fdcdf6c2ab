use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use super::models::{BusinessView, PlatformUser, UserRole, UserSnapshot};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Identity and role lookups consumed by the impersonation flow
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlatformUser>, DirectoryError>;

    /// Active companies ordered by name, each with its verified, active,
    /// non-admin members
    async fn active_businesses(&self) -> Result<Vec<BusinessView>, DirectoryError>;
}

/// Postgres-backed directory reading the shared `users` and `companies` tables
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &PgRow) -> Result<PlatformUser, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(PlatformUser {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: UserRole::parse(&role),
            company_id: row.try_get("company_id")?,
            is_active: row.try_get("is_active")?,
            email_verified_at: row.try_get("email_verified_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl IdentityDirectory for PgDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlatformUser>, DirectoryError> {
        let query = r#"
            SELECT
                id, name, email, role, company_id,
                is_active, email_verified_at, created_at
            FROM users
            WHERE id = $1
            AND deleted_at IS NULL
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref()
            .map(Self::user_from_row)
            .transpose()
            .map_err(DirectoryError::from)
    }

    async fn active_businesses(&self) -> Result<Vec<BusinessView>, DirectoryError> {
        let companies = sqlx::query(
            r#"
            SELECT id, name
            FROM companies
            WHERE is_active = true
            AND deleted_at IS NULL
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if companies.is_empty() {
            return Ok(Vec::new());
        }

        let company_ids: Vec<Uuid> = companies
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<_, _>>()?;

        let members = sqlx::query(
            r#"
            SELECT
                id, name, email, role, company_id,
                is_active, email_verified_at, created_at
            FROM users
            WHERE company_id = ANY($1)
            AND role <> 'super_admin'
            AND is_active = true
            AND email_verified_at IS NOT NULL
            AND deleted_at IS NULL
            ORDER BY name
            "#,
        )
        .bind(&company_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_company: HashMap<Uuid, Vec<UserSnapshot>> = HashMap::new();
        for row in &members {
            let user = Self::user_from_row(row)?;
            if let Some(company_id) = user.company_id {
                by_company.entry(company_id).or_default().push(user.snapshot());
            }
        }

        companies
            .iter()
            .map(|row| -> Result<BusinessView, DirectoryError> {
                let id: Uuid = row.try_get("id")?;
                Ok(BusinessView {
                    id,
                    name: row.try_get("name")?,
                    users: by_company.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }
}
