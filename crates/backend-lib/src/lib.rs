// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend functionality for the Docsmith document-generation
//! service: credential verification, session persistence, token
//! issuance and the request-authorization gates.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;

use crate::auth::{
    Authenticator, ClaimsAuthenticator, ClaimsCodec, CredentialVerifier, LoginRateLimiter,
    SessionAuthenticator, SessionManager,
};
use crate::config::{AuthSettings, Settings};
use crate::storage::UserStore;
use docsmith_common::{Role, UserRecord};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Principal store
    pub users: S,
    /// Session store
    pub sessions: Arc<SessionManager>,
    /// Credential verifier
    pub verifier: CredentialVerifier<S>,
    /// Claims-token codec
    pub claims: ClaimsCodec,
    /// Stateful verification strategy (cookie surface)
    pub session_auth: Arc<dyn Authenticator>,
    /// Stateless verification strategy (bearer surface)
    pub claims_auth: Arc<dyn Authenticator>,
    /// Login attempt limiter
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl<S: UserStore + Clone + Send + Sync + 'static> AppState<S> {
    /// Create a new application state
    pub async fn new(users: S, settings: Settings) -> anyhow::Result<Self> {
        let sessions = Arc::new(
            SessionManager::with_persistence(&settings.data_dir, settings.auth.session_ttl_secs)
                .await?,
        );
        sessions.start_sweeper();

        let verifier = CredentialVerifier::new(users.clone(), &settings.auth);
        let claims = ClaimsCodec::new(
            &settings.auth.signing_secret,
            settings.auth.claims_ttl_secs,
        );
        let session_auth: Arc<dyn Authenticator> =
            Arc::new(SessionAuthenticator::new(sessions.clone(), users.clone()));
        let claims_auth: Arc<dyn Authenticator> =
            Arc::new(ClaimsAuthenticator::new(claims.clone()));

        ensure_bootstrap_admin(&users, &settings.auth).await?;

        Ok(Self {
            users,
            sessions,
            verifier,
            claims,
            session_auth,
            claims_auth,
            login_limiter: Arc::new(LoginRateLimiter::default()),
            settings: Arc::new(settings),
        })
    }
}

/// Provision the reserved administrator account if it does not exist.
///
/// The record is created without a stored hash, so it is only
/// authenticatable through the bootstrap branch until a real password
/// is set.
async fn ensure_bootstrap_admin<S: UserStore>(
    users: &S,
    auth: &AuthSettings,
) -> anyhow::Result<()> {
    if users.find_by_email(&auth.bootstrap_email).await?.is_none() {
        let admin = UserRecord::new(auth.bootstrap_email.clone(), None, None, Role::Admin);
        users.create_user(&admin).await?;
        tracing::info!(
            email = %auth.bootstrap_email,
            "provisioned bootstrap administrator (no stored secret)"
        );
    }
    Ok(())
}
