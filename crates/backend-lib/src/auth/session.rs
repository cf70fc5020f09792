// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session store: server-held records binding opaque tokens to
//! principals, with an encrypted on-disk snapshot so sessions survive
//! server restarts.
use crate::auth::token::mint_session_token;
use crate::metrics as keys;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs as tokio_fs,
    sync::{Mutex, RwLock},
};
use uuid::Uuid;

/// Default cookie-session TTL in seconds
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24; // 24 hours

/// Sweep interval for the expired-session cleanup task
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// A server-held session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token; the primary lookup key
    pub token: String,
    /// Owning principal
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session manager for handling authentication tokens.
///
/// Expiry is enforced lazily at lookup; the sweeper task only reclaims
/// memory. Writes are atomic with respect to concurrent reads by token.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl_secs: u64,
    persist: Option<Persistence>,
    save_lock: Arc<Mutex<()>>,
}

impl SessionManager {
    /// Create an in-memory session manager
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs,
            persist: None,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /** Create a session manager with a durable snapshot under `dir`.

    The snapshot is AES-GCM encrypted with a key loaded from
    `session.key` in the same directory (generated on first run).
    Previously persisted, still-unexpired sessions are loaded. */
    pub async fn with_persistence<P: AsRef<Path>>(dir: P, ttl_secs: u64) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let key = load_or_generate_key(&dir.join("session.key"))?;
        let persist = Persistence {
            path: dir.join("sessions.dat"),
            key,
        };

        let manager = Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs,
            persist: Some(persist),
            save_lock: Arc::new(Mutex::new(())),
        };
        manager.load_snapshot().await?;
        Ok(manager)
    }

    /// Create a new session for a principal.
    ///
    /// Each call produces an independent session; concurrent logins for
    /// the same principal are supported and independently invalidatable.
    pub async fn create(&self, user_id: Uuid) -> Session {
        let now = Utc::now();
        let session = Session {
            token: mint_session_token(user_id, now),
            user_id,
            created_at: now,
            expires_at: now + Duration::seconds(self.ttl_secs as i64),
        };

        {
            let mut sessions = self.sessions.write().await;
            let prev = sessions.insert(session.token.clone(), session.clone());
            // 256-bit random tokens cannot collide in practice
            debug_assert!(prev.is_none(), "session token collision");

            counter!(keys::SESSION_CREATED).increment(1);
            gauge!(keys::SESSIONS_ACTIVE).set(sessions.len() as f64);
        }

        self.save().await;
        session
    }

    /// Exact-match lookup; expired sessions are never returned.
    ///
    /// The stale row may remain in the map until the sweeper runs, but
    /// it is unobservable through this method.
    pub async fn find_by_token(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|session| !session.is_expired(Utc::now()))
            .cloned()
    }

    /// Delete a session by token; deleting an absent token is not an error
    pub async fn invalidate(&self, token: &str) {
        let removed = {
            let mut sessions = self.sessions.write().await;
            let removed = sessions.remove(token).is_some();
            if removed {
                counter!(keys::SESSION_INVALIDATED).increment(1);
                gauge!(keys::SESSIONS_ACTIVE).set(sessions.len() as f64);
            }
            removed
        };

        if removed {
            self.save().await;
        }
    }

    /// Delete every session owned by a principal
    pub async fn invalidate_for_user(&self, user_id: Uuid) {
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, session| session.user_id != user_id);
            let removed = before - sessions.len();
            if removed > 0 {
                counter!(keys::SESSION_INVALIDATED).increment(removed as u64);
                gauge!(keys::SESSIONS_ACTIVE).set(sessions.len() as f64);
            }
        }

        self.save().await;
    }

    /// Return count of live (unexpired) sessions
    pub async fn active_count(&self) -> usize {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| !s.is_expired(now)).count()
    }

    /// Spawn the periodic cleanup task that reclaims expired rows
    pub fn start_sweeper(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SWEEP_INTERVAL).await;
                manager.sweep_expired().await;
            }
        });
    }

    async fn sweep_expired(&self) {
        let removed = {
            let mut sessions = self.sessions.write().await;
            let now = Utc::now();
            let before = sessions.len();
            sessions.retain(|_, session| !session.is_expired(now));
            let removed = before - sessions.len();
            if removed > 0 {
                counter!(keys::SESSIONS_EXPIRED).increment(removed as u64);
                gauge!(keys::SESSIONS_ACTIVE).set(sessions.len() as f64);
            }
            removed
        };

        if removed > 0 {
            tracing::debug!(removed, "swept expired sessions");
            self.save().await;
        }
    }

    /// Write the current session map to the encrypted snapshot.
    ///
    /// Persistence is best-effort: the in-memory map remains the source
    /// of truth for this process, so a failed save is logged, not fatal.
    async fn save(&self) {
        let Some(persist) = &self.persist else {
            return;
        };

        // Serialize saves so concurrent mutations cannot interleave
        // partial snapshot writes.
        let _guard = self.save_lock.lock().await;
        let snapshot = self.sessions.read().await.clone();
        if let Err(err) = persist.write(&snapshot).await {
            tracing::warn!(error = %err, "failed to persist session snapshot");
        }
    }

    async fn load_snapshot(&self) -> anyhow::Result<()> {
        let Some(persist) = &self.persist else {
            return Ok(());
        };
        let Some(entries) = persist.read().await? else {
            return Ok(());
        };

        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        for (token, session) in entries {
            // Skip sessions that expired while the server was down
            if !session.is_expired(now) {
                sessions.insert(token, session);
            }
        }
        gauge!(keys::SESSIONS_ACTIVE).set(sessions.len() as f64);
        tracing::info!(count = sessions.len(), "loaded persisted sessions");
        Ok(())
    }
}

/// Encrypted snapshot storage: 12-byte nonce followed by the ciphertext
#[derive(Clone)]
struct Persistence {
    path: PathBuf,
    key: [u8; 32],
}

impl Persistence {
    async fn write(&self, snapshot: &HashMap<String, Session>) -> anyhow::Result<()> {
        let json = serde_json::to_vec(snapshot)?;

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| anyhow::anyhow!("invalid session snapshot key length"))?;
        let nonce_bytes = generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, json.as_slice())
            .map_err(|_| anyhow::anyhow!("session snapshot encryption failed"))?;

        let mut combined = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        tokio_fs::write(&self.path, &combined).await?;
        Ok(())
    }

    async fn read(&self) -> anyhow::Result<Option<HashMap<String, Session>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let combined = tokio_fs::read(&self.path).await?;
        if combined.len() < 12 {
            anyhow::bail!("invalid session snapshot file");
        }
        let (nonce_bytes, ciphertext) = combined.split_at(12);

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| anyhow::anyhow!("invalid session snapshot key length"))?;
        let nonce = Nonce::from_slice(nonce_bytes);
        let json = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("session snapshot decryption failed"))?;

        let entries: HashMap<String, Session> = serde_json::from_slice(&json)?;
        Ok(Some(entries))
    }
}

/// Load the snapshot key, generating and saving one on first run
fn load_or_generate_key(path: &Path) -> anyhow::Result<[u8; 32]> {
    let mut key = [0u8; 32];
    if path.exists() {
        let key_data = fs::read(path)?;
        if key_data.len() != 32 {
            anyhow::bail!("invalid session key length");
        }
        key.copy_from_slice(&key_data);
    } else {
        OsRng.fill_bytes(&mut key);
        fs::write(path, key)?;
    }
    Ok(key)
}

/// Generate a random nonce for AES-GCM
fn generate_nonce() -> [u8; 12] {
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
