use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use superuser_api::app::app;
use superuser_api::audit::{AuditSink, MemoryAuditSink, PgAuditSink};
use superuser_api::auth::JwtIssuer;
use superuser_api::config;
use superuser_api::database::{DatabaseManager, IdentityDirectory, MemoryDirectory, PgDirectory};
use superuser_api::services::ImpersonationService;
use superuser_api::session::{spawn_sweeper, MemorySessionStore};
use superuser_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Superuser API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let pool = match config.database.url {
        Some(_) => Some(
            DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?,
        ),
        None => None,
    };

    let directory: Arc<dyn IdentityDirectory>;
    let audit: Arc<dyn AuditSink>;
    match pool.clone() {
        Some(pool) => {
            directory = Arc::new(PgDirectory::new(pool.clone()));
            audit = Arc::new(PgAuditSink::new(pool));
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; using in-memory directory and audit trail (no users available)"
            );
            directory = Arc::new(MemoryDirectory::new());
            audit = Arc::new(MemoryAuditSink::new());
        }
    }

    let store = MemorySessionStore::new();
    let sweeper = spawn_sweeper(store.clone(), config.impersonation.sweep_interval());

    let issuer = JwtIssuer::from_config(&config.security);
    let service = ImpersonationService::new(
        directory,
        Arc::new(store),
        audit,
        Arc::new(issuer.clone()),
        config.impersonation.clone(),
    );

    let state = AppState::new(service, issuer, pool);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Superuser API listening on http://{}", bind_addr);

    let result = axum::serve(listener, app(state)).await;
    sweeper.abort();
    result.context("server error")
}
