use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsmith_common::Role;
use uuid::Uuid;

/// Identity resolved from a presented credential
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// One verification interface over both credential kinds: the stateful
/// session token and the stateless claims token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<AuthContext, AppError>;
}
