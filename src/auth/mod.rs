use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::PlatformUser;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub company: Option<Uuid>,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_user(user: &PlatformUser, expiry: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            company: user.company_id,
            role: user.role.as_str().to_string(),
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Mints bearer credentials for an identity
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self, user: &PlatformUser) -> Result<String, JwtError>;
}

/// HS256 issuer shared by normal logins and delegated impersonation tokens
#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    expiry: Duration,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>, expiry: Duration) -> Self {
        Self {
            secret: secret.into(),
            expiry,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            security.jwt_secret.clone(),
            Duration::hours(security.jwt_expiry_hours as i64),
        )
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), claims, &encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Validate signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

impl CredentialIssuer for JwtIssuer {
    fn issue(&self, user: &PlatformUser) -> Result<String, JwtError> {
        self.encode_claims(&Claims::for_user(user, self.expiry))
    }
}
