use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::auth::{CredentialIssuer, JwtError};
use crate::config::ImpersonationConfig;
use crate::database::models::{BusinessView, PlatformUser, UserSnapshot};
use crate::database::{DirectoryError, IdentityDirectory};
use crate::session::{SessionStore, StoreError};

/// 160 bits of entropy per impersonation token
const TOKEN_BYTES: usize = 20;

const GRANT_KEY_PREFIX: &str = "impersonation:";
const ACTOR_KEY_PREFIX: &str = "impersonation:actor:";

#[derive(Debug, Error)]
pub enum ImpersonationError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] JwtError),
}

/// A temporary authorization for `actor_id` to act as `target_id`.
///
/// The token itself is not persisted; the store keys grants by its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationGrant {
    #[serde(skip)]
    pub token: String,
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub original_user: UserSnapshot,
    pub target_user: UserSnapshot,
}

impl ImpersonationGrant {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whole minutes left, floored; negative once past `expires_at`
    pub fn remaining_minutes_at(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().div_euclid(60)
    }
}

/// Result of a successful `begin`
#[derive(Debug, Clone)]
pub struct IssuedImpersonation {
    pub grant: ImpersonationGrant,
    /// Bearer credential for the target identity
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpersonationStatus {
    pub impersonating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user: Option<UserSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_user: Option<UserSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<i64>,
}

impl ImpersonationStatus {
    pub fn inactive() -> Self {
        Self {
            impersonating: false,
            target_user: None,
            original_user: None,
            started_at: None,
            expires_at: None,
            remaining_minutes: None,
        }
    }

    fn active(grant: ImpersonationGrant, now: DateTime<Utc>) -> Self {
        let remaining = grant.remaining_minutes_at(now);
        Self {
            impersonating: true,
            target_user: Some(grant.target_user),
            original_user: Some(grant.original_user),
            started_at: Some(grant.issued_at),
            expires_at: Some(grant.expires_at),
            remaining_minutes: Some(remaining),
        }
    }
}

/// Issues, inspects and reverts impersonation grants
pub struct ImpersonationService {
    directory: Arc<dyn IdentityDirectory>,
    store: Arc<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
    issuer: Arc<dyn CredentialIssuer>,
    config: ImpersonationConfig,
}

impl ImpersonationService {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        store: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
        issuer: Arc<dyn CredentialIssuer>,
        config: ImpersonationConfig,
    ) -> Self {
        Self {
            directory,
            store,
            audit,
            issuer,
            config,
        }
    }

    pub fn config(&self) -> &ImpersonationConfig {
        &self.config
    }

    /// Start acting as `target_id` on behalf of the platform admin `actor_id`
    pub async fn begin(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<IssuedImpersonation, ImpersonationError> {
        let actor = self.require_platform_admin(actor_id).await?;

        let target = self
            .directory
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| ImpersonationError::NotFound(format!("User {} not found", target_id)))?;

        if target.is_platform_admin() {
            warn!("Impersonation denied: {} tried to impersonate platform admin {}", actor.id, target.id);
            return Err(ImpersonationError::Forbidden(
                "Cannot impersonate a platform administrator".to_string(),
            ));
        }

        if !target.is_verified() {
            warn!("Impersonation denied: target {} is unverified or inactive", target.id);
            return Err(ImpersonationError::Forbidden(
                "Cannot impersonate an unverified or inactive user".to_string(),
            ));
        }

        // Mint the credential first so a failure leaves nothing behind
        let api_token = self.issuer.issue(&target)?;

        let token = generate_token();
        let digest = token_digest(&token);
        let issued_at = Utc::now();
        let expires_at = issued_at + chrono::Duration::seconds(self.config.grant_ttl_secs as i64);

        let grant = ImpersonationGrant {
            token,
            actor_id: actor.id,
            target_id: target.id,
            issued_at,
            expires_at,
            original_user: actor.snapshot(),
            target_user: target.snapshot(),
        };

        let payload = serde_json::to_string(&grant).map_err(StoreError::from)?;
        self.store
            .put(&grant_key(&digest), payload, self.config.grant_ttl())
            .await?;

        if self.config.single_grant_per_actor {
            self.replace_previous_grant(actor.id, &digest).await?;
        }

        self.record(AuditEntry::new(
            AuditAction::ImpersonationStarted,
            actor.id,
            "user",
            target.id,
            Some(format!("Started impersonating {}", target.email)),
        ))
        .await;

        info!("Impersonation started: {} -> {} until {}", actor.id, target.id, expires_at);

        Ok(IssuedImpersonation { grant, api_token })
    }

    /// End the grant behind `token`
    pub async fn revert(&self, token: &str) -> Result<ImpersonationGrant, ImpersonationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ImpersonationError::Validation(
                "impersonation_token is required".to_string(),
            ));
        }

        let digest = token_digest(token);
        let key = grant_key(&digest);
        let grant = self.load(token, &digest).await?.ok_or_else(not_found)?;

        // Only the caller whose delete removed the entry ends the grant
        if !self.store.delete(&key).await? {
            return Err(not_found());
        }

        if self.config.single_grant_per_actor {
            self.clear_actor_index(grant.actor_id, &digest).await;
        }

        self.record(AuditEntry::new(
            AuditAction::ImpersonationEnded,
            grant.actor_id,
            "user",
            grant.target_id,
            Some(format!("Stopped impersonating {}", grant.target_user.email)),
        ))
        .await;

        info!("Impersonation ended: {} -> {}", grant.actor_id, grant.target_id);

        Ok(grant)
    }

    /// Describe the grant behind `token`; missing and expired look the same
    pub async fn status(&self, token: Option<&str>) -> Result<ImpersonationStatus, ImpersonationError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(ImpersonationStatus::inactive()),
        };

        let digest = token_digest(token);
        Ok(match self.load(token, &digest).await? {
            Some(grant) => ImpersonationStatus::active(grant, Utc::now()),
            None => ImpersonationStatus::inactive(),
        })
    }

    /// Companies and member accounts an operator can pick a target from
    pub async fn businesses(&self, actor_id: Uuid) -> Result<Vec<BusinessView>, ImpersonationError> {
        self.require_platform_admin(actor_id).await?;
        Ok(self.directory.active_businesses().await?)
    }

    async fn require_platform_admin(&self, actor_id: Uuid) -> Result<PlatformUser, ImpersonationError> {
        match self.directory.find_by_id(actor_id).await? {
            Some(actor) if actor.is_platform_admin() => Ok(actor),
            _ => {
                warn!("Impersonation denied: {} is not a platform admin", actor_id);
                Err(ImpersonationError::Forbidden(
                    "Platform administrator privileges required".to_string(),
                ))
            }
        }
    }

    async fn load(&self, token: &str, digest: &str) -> Result<Option<ImpersonationGrant>, ImpersonationError> {
        let key = grant_key(digest);
        let Some(payload) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let mut grant: ImpersonationGrant =
            serde_json::from_str(&payload).map_err(StoreError::from)?;
        grant.token = token.to_string();

        if self.config.enforce_expiry && grant.is_expired_at(Utc::now()) {
            debug!("Discarding expired impersonation grant for {}", grant.target_id);
            self.store.delete(&key).await?;
            return Ok(None);
        }

        Ok(Some(grant))
    }

    /// Point the actor index at `digest` and delete whatever grant it pointed at.
    /// On failure the new grant is withdrawn so the previous one stays in force.
    async fn replace_previous_grant(&self, actor_id: Uuid, digest: &str) -> Result<(), ImpersonationError> {
        let previous = match self
            .store
            .swap(&actor_key(actor_id), digest.to_string(), self.config.grant_ttl())
            .await
        {
            Ok(previous) => previous,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&grant_key(digest)).await {
                    error!("Failed to withdraw impersonation grant of {}: {}", actor_id, cleanup);
                }
                return Err(e.into());
            }
        };

        if let Some(previous) = previous.filter(|p| p != digest) {
            match self.store.delete(&grant_key(&previous)).await {
                Ok(true) => info!("Replaced previous impersonation grant of {}", actor_id),
                Ok(false) => {}
                Err(e) => error!("Failed to delete replaced impersonation grant of {}: {}", actor_id, e),
            }
        }
        Ok(())
    }

    async fn clear_actor_index(&self, actor_id: Uuid, digest: &str) {
        let index = actor_key(actor_id);
        let cleared = match self.store.get(&index).await {
            Ok(Some(current)) if current == digest => self.store.delete(&index).await.map(|_| ()),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = cleared {
            warn!("Failed to clear impersonation index of {}: {}", actor_id, e);
        }
    }

    async fn record(&self, entry: AuditEntry) {
        let action = entry.action;
        if let Err(e) = self.audit.append(entry).await {
            error!("Failed to append audit entry {}: {}", action.as_str(), e);
        }
    }
}

fn not_found() -> ImpersonationError {
    ImpersonationError::NotFound("Invalid or expired impersonation token".to_string())
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn grant_key(digest: &str) -> String {
    format!("{}{}", GRANT_KEY_PREFIX, digest)
}

fn actor_key(actor_id: Uuid) -> String {
    format!("{}{}", ACTOR_KEY_PREFIX, actor_id)
}
