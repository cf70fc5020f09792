// ============================
// crates/backend-lib/src/auth/credentials.rs
// ============================
//! Credential verification.
use crate::auth::password::verify_password;
use crate::config::AuthSettings;
use crate::error::AppError;
use crate::storage::UserStore;
use docsmith_common::{Role, UserRecord};

/// Verifies a submitted (identifier, secret) pair against the stored
/// principal record.
#[derive(Clone)]
pub struct CredentialVerifier<S> {
    users: S,
    bootstrap_email: String,
    bootstrap_password: String,
}

impl<S: UserStore> CredentialVerifier<S> {
    pub fn new(users: S, auth: &AuthSettings) -> Self {
        Self {
            users,
            bootstrap_email: auth.bootstrap_email.trim().to_lowercase(),
            bootstrap_password: auth.bootstrap_password.clone(),
        }
    }

    /** Verify credentials and optionally require a role.

    Check order:
    1. both fields must be non-empty
    2. the principal must exist
    3. a stored hash always wins: once a real secret is set the
       bootstrap branch is unreachable for that principal
    4. a principal without a stored hash passes only when it is the
       single reserved bootstrap address presented with the configured
       bootstrap secret; every other hash-less principal fails
    5. role check last, so a role failure means the secret was correct */
    pub async fn verify(
        &self,
        identifier: &str,
        secret: &str,
        required_role: Option<Role>,
    ) -> Result<UserRecord, AppError> {
        if identifier.trim().is_empty() || secret.is_empty() {
            return Err(AppError::MissingCredentials);
        }

        let user = self
            .users
            .find_by_email(identifier)
            .await?
            .ok_or(AppError::UnknownPrincipal)?;

        match &user.password_hash {
            Some(hash) => {
                if !verify_password(hash, secret) {
                    return Err(AppError::InvalidSecret);
                }
            },
            None => {
                let is_bootstrap =
                    user.email == self.bootstrap_email && secret == self.bootstrap_password;
                if !is_bootstrap {
                    return Err(AppError::InvalidSecret);
                }
                tracing::warn!(
                    email = %user.email,
                    "bootstrap login with provisioning credential; set a real password"
                );
            },
        }

        if let Some(required) = required_role {
            if user.role != required {
                return Err(AppError::InsufficientRole);
            }
        }

        Ok(user)
    }
}
