// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Principal storage abstraction with flat-file implementation.
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use docsmith_common::UserRecord;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tokio::fs as tokio_fs;
use uuid::Uuid;

/// Trait for principal storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new principal record. Fails if the email is taken.
    async fn create_user(&self, user: &UserRecord) -> Result<(), AppError>;

    /// Look up a principal by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Look up a principal by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError>;

    /// Replace a principal's stored password hash
    async fn set_password_hash(&self, email: &str, hash: &str) -> Result<(), AppError>;
}

/// Flat-file implementation of the `UserStore` trait.
///
/// One JSON file per principal under `users/`, keyed by the encoded
/// lowercased email; `user-ids/` maps principal id back to that key.
#[derive(Clone)]
pub struct FlatFileUserStore {
    root: PathBuf,
}

impl FlatFileUserStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users"))?;
        fs::create_dir_all(root.join("user-ids"))?;
        Ok(Self { root })
    }

    fn user_path(&self, email: &str) -> PathBuf {
        self.root.join("users").join(format!("{}.json", email_key(email)))
    }

    fn id_path(&self, id: Uuid) -> PathBuf {
        self.root.join("user-ids").join(id.to_string())
    }

    async fn read_user(&self, path: &Path) -> Result<Option<UserRecord>, AppError> {
        let content = match tokio_fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(unavailable(err)),
        };
        let user: UserRecord = serde_json::from_str(&content)?;
        Ok(Some(user))
    }
}

/// Filesystem-safe key for an email address
fn email_key(email: &str) -> String {
    URL_SAFE_NO_PAD.encode(email.trim().to_lowercase())
}

/// The durable store could not be reached; callers fail closed.
fn unavailable(err: io::Error) -> AppError {
    tracing::warn!(error = %err, "user store unavailable");
    AppError::StorageUnavailable
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn create_user(&self, user: &UserRecord) -> Result<(), AppError> {
        let path = self.user_path(&user.email);
        if path.exists() {
            return Err(AppError::InvalidInput("email already registered".to_string()));
        }

        let json = serde_json::to_string_pretty(user)?;
        tokio_fs::write(&path, json).await.map_err(unavailable)?;
        tokio_fs::write(self.id_path(user.id), email_key(&user.email))
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        self.read_user(&self.user_path(email)).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let key = match tokio_fs::read_to_string(self.id_path(id)).await {
            Ok(key) => key,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(unavailable(err)),
        };
        let path = self.root.join("users").join(format!("{key}.json"));
        self.read_user(&path).await
    }

    async fn set_password_hash(&self, email: &str, hash: &str) -> Result<(), AppError> {
        let path = self.user_path(email);
        let mut user = self
            .read_user(&path)
            .await?
            .ok_or(AppError::UnknownPrincipal)?;
        user.password_hash = Some(hash.to_string());

        let json = serde_json::to_string_pretty(&user)?;
        tokio_fs::write(&path, json).await.map_err(unavailable)?;
        Ok(())
    }
}
