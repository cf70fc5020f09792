use crate::auth::session::SessionManager;
use crate::auth::token::ClaimsCodec;
use crate::auth::{AuthContext, Authenticator};
use crate::error::AppError;
use crate::storage::UserStore;
use async_trait::async_trait;
use chrono::DateTime;
use std::sync::Arc;
use uuid::Uuid;

/// Stateful strategy: the session store is the source of truth.
/// One storage round trip per request.
pub struct SessionAuthenticator<S> {
    sessions: Arc<SessionManager>,
    users: S,
}

impl<S> SessionAuthenticator<S> {
    pub fn new(sessions: Arc<SessionManager>, users: S) -> Self {
        Self { sessions, users }
    }
}

#[async_trait]
impl<S: UserStore> Authenticator for SessionAuthenticator<S> {
    async fn authenticate(&self, credential: &str) -> Result<AuthContext, AppError> {
        let session = self
            .sessions
            .find_by_token(credential)
            .await
            .ok_or(AppError::SessionNotFound)?;

        // The owner must exist; a dangling session is treated the same
        // as no session at all
        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        Ok(AuthContext {
            user_id: user.id,
            email: user.email,
            role: user.role,
            expires_at: session.expires_at,
        })
    }
}

/// Stateless strategy: signature + expiry check, no store round trip.
pub struct ClaimsAuthenticator {
    codec: ClaimsCodec,
}

impl ClaimsAuthenticator {
    pub fn new(codec: ClaimsCodec) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl Authenticator for ClaimsAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<AuthContext, AppError> {
        let claims = self.codec.decode(credential)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenMalformed)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AppError::TokenMalformed)?;

        Ok(AuthContext {
            user_id,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }
}
