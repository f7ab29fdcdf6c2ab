use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account role. `SuperAdmin` is the platform tier; the rest are tenant roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRole {
    SuperAdmin,
    Owner,
    Manager,
    Cashier,
    Other(String),
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Owner => "owner",
            UserRole::Manager => "manager",
            UserRole::Cashier => "cashier",
            UserRole::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "super_admin" => UserRole::SuperAdmin,
            "owner" => UserRole::Owner,
            "manager" => UserRole::Manager,
            "cashier" => UserRole::Cashier,
            other => UserRole::Other(other.to_string()),
        }
    }

    pub fn is_platform_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UserRole {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(UserRole::parse(&s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub company_id: Option<Uuid>,
    pub is_active: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PlatformUser {
    /// Verified email and an active account
    pub fn is_verified(&self) -> bool {
        self.is_active && self.email_verified_at.is_some()
    }

    pub fn is_platform_admin(&self) -> bool {
        self.role.is_platform_admin()
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            company_id: self.company_id,
        }
    }
}

/// Identity as shown to operators; copied into grants at issue time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub company_id: Option<Uuid>,
}
