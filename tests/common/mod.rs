#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use uuid::Uuid;

use superuser_api::app::app;
use superuser_api::audit::MemoryAuditSink;
use superuser_api::auth::{Claims, JwtIssuer};
use superuser_api::config::ImpersonationConfig;
use superuser_api::database::models::{Company, PlatformUser, UserRole};
use superuser_api::database::MemoryDirectory;
use superuser_api::services::ImpersonationService;
use superuser_api::session::MemorySessionStore;
use superuser_api::state::AppState;

pub const TEST_SECRET: &str = "integration-secret";

/// A server running in-process on its own port, backed by in-memory collaborators
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub issuer: JwtIssuer,
    pub audit: MemoryAuditSink,
    pub company: Company,
    pub admin: PlatformUser,
    pub owner: PlatformUser,
    pub cashier: PlatformUser,
    pub unverified: PlatformUser,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(ImpersonationConfig::default()).await
    }

    pub async fn start_with(config: ImpersonationConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let directory = MemoryDirectory::new();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Harbour Bakery".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        directory.insert_company(company.clone()).await;

        let admin = user("Ada Admin", UserRole::SuperAdmin, None, true);
        let owner = user("Olive Owner", UserRole::Owner, Some(company.id), true);
        let cashier = user("Cass Cashier", UserRole::Cashier, Some(company.id), true);
        let unverified = user("Uma Unverified", UserRole::Manager, Some(company.id), false);
        for u in [&admin, &owner, &cashier, &unverified] {
            directory.insert_user(u.clone()).await;
        }

        let issuer = JwtIssuer::new(TEST_SECRET, chrono::Duration::hours(1));
        let audit = MemoryAuditSink::new();
        let service = ImpersonationService::new(
            Arc::new(directory),
            Arc::new(MemorySessionStore::new()),
            Arc::new(audit.clone()),
            Arc::new(issuer.clone()),
            config,
        );
        let state = AppState::new(service, issuer.clone(), None);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            issuer,
            audit,
            company,
            admin,
            owner,
            cashier,
            unverified,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token as a normal login would have issued it
    pub fn token_for(&self, user: &PlatformUser) -> String {
        let claims = Claims::for_user(user, chrono::Duration::hours(1));
        self.issuer
            .encode_claims(&claims)
            .expect("failed to encode test token")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(&self.admin)
    }
}

pub fn user(name: &str, role: UserRole, company_id: Option<Uuid>, verified: bool) -> PlatformUser {
    let id = Uuid::new_v4();
    PlatformUser {
        id,
        name: name.to_string(),
        email: format!("{}@example.test", id.simple()),
        role,
        company_id,
        is_active: true,
        email_verified_at: verified.then(Utc::now),
        created_at: Utc::now(),
    }
}
