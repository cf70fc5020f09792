// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod credentials;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use credentials::CredentialVerifier;
pub use password::{
    hash_password, hash_password_secure, validate_password_strength, verify_password,
    PasswordRequirements, MIN_PASSWORD_LENGTH,
};
pub use rate_limit::LoginRateLimiter;
pub use session::{Session, SessionManager, SESSION_TTL_SECS};
pub use service::{AuthContext, Authenticator};
pub use service_impl::{ClaimsAuthenticator, SessionAuthenticator};
pub use token::{mint_session_token, Claims, ClaimsCodec};
