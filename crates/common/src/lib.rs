// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! shared between the Docsmith web client and the backend.
//! This module defines the auth API request/response types and the
//! stored principal record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a principal; authorization decisions are a function
/// of the current role only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Client,
}

/// A stored principal record.
///
/// `password_hash` is optional: a record without one can only
/// authenticate through the reserved bootstrap branch, and only for the
/// single configured bootstrap address.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    /// Unique, stored lowercased.
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        email: impl Into<String>,
        name: Option<String>,
        password_hash: Option<String>,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into().trim().to_lowercase(),
            name,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

/// Credentials submitted to the login endpoints.
/// # Fields
/// * `identifier` - The principal's email address
/// * `secret` - The plaintext password
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub secret: String,
}

/// Body for the self-service registration endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body for the authenticated set-password endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// Principal summary returned by login and registration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrincipalSummary {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&UserRecord> for PrincipalSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Bearer token issued by the API login endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity echo returned by the `me` endpoints.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Unconditional success acknowledgement (logout, set-password).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AckResponse {
    pub success: bool,
}
