// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Token encodings for the two authentication surfaces.

The opaque session token is a lookup key only: it embeds the principal
id and issuance time for operational traceability, but validity and
expiry live exclusively in the session store, so there is no decoder.

The claims token is self-contained: signed payload carrying principal
id, email, role and expiry, verified without any store round trip. */
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use docsmith_common::{Role, UserRecord};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random suffix size in bytes (32 bytes = 256 bits of entropy)
const SESSION_TOKEN_BYTES: usize = 32;

/** Mint an opaque session token.

The 256-bit random suffix makes collisions structurally negligible;
the store treats an insert over an existing token as an invariant
violation, not a recoverable error.
# Returns
A base64 URL-safe encoded string without padding */
pub fn mint_session_token(user_id: Uuid, issued_at: DateTime<Utc>) -> String {
    let mut entropy = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut entropy);
    let raw = format!(
        "{}.{}.{}",
        user_id.simple(),
        issued_at.timestamp(),
        URL_SAFE_NO_PAD.encode(entropy)
    );
    URL_SAFE_NO_PAD.encode(raw)
}

/// Claims carried by the stateless token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Codec for the stateless claims token (HS256)
#[derive(Clone)]
pub struct ClaimsCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl ClaimsCodec {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issue a signed claims token for a principal
    pub fn encode(&self, user: &UserRecord) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.ttl_secs as i64);
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign claims token: {e}")))?;
        Ok((token, expires_at))
    }

    /// Decode and verify a claims token.
    ///
    /// Malformed, tampered and expired tokens all fail with the same
    /// kind; nothing distinguishes a bad signature from a stale token.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::TokenMalformed)
    }
}
