// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use crate::auth::password::PasswordRequirements;
use anyhow::Result;
use docsmith_common::Role;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path (user records, session snapshot)
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Authentication settings
    pub auth: AuthSettings,
    /// Authorization gate settings
    pub gate: GateSettings,
}

/// Authentication settings.
///
/// The signing secret and the bootstrap credential are configuration,
/// never literals in code. Both carry development defaults that must be
/// overridden in production (`DOCSMITH_AUTH__SIGNING_SECRET` etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Secret used to sign stateless claims tokens
    pub signing_secret: String,
    /// Cookie-session TTL in seconds
    pub session_ttl_secs: u64,
    /// Claims-token validity window in seconds
    pub claims_ttl_secs: u64,
    /// Reserved bootstrap administrator address
    pub bootstrap_email: String,
    /// Fixed bootstrap secret, valid only for the reserved address while
    /// that account has no stored hash
    pub bootstrap_password: String,
    /// Password requirements applied at registration
    pub password_requirements: PasswordRequirements,
}

/// Authorization gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    /// Path prefix the gate protects
    pub protected_prefix: String,
    /// Redirect target on denial
    pub login_path: String,
    /// Sub-paths exempt from the gate check
    pub exempt_paths: Vec<String>,
    /// Session cookie name
    pub cookie_name: String,
    /// Role required to pass the gate
    pub required_role: Role,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            auth: AuthSettings::default(),
            gate: GateSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            signing_secret: "development-secret-change-in-production".to_string(),
            session_ttl_secs: 60 * 60 * 24, // 24 hours
            claims_ttl_secs: 60 * 60 * 24 * 7, // 7 days
            bootstrap_email: "admin@docsmith.local".to_string(),
            bootstrap_password: "admin123".to_string(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            protected_prefix: "/admin".to_string(),
            login_path: "/admin/login".to_string(),
            // logout is exempt so a stale cookie can still be cleared
            exempt_paths: vec!["/admin/login".to_string(), "/admin/logout".to_string()],
            cookie_name: "docsmith_session".to_string(),
            required_role: Role::Admin,
        }
    }
}

impl Settings {
    /// Load settings from config files and environment variables
    pub fn load() -> Result<Self> {
        Self::figment()
            .merge(Toml::file("docsmith.toml"))
            .merge(Yaml::file("docsmith.yaml"))
            .merge(Json::file("docsmith.json"))
            .merge(Env::prefixed("DOCSMITH_").split("__"))
            .extract()
            .map_err(Into::into)
    }

    /// Load settings from an explicit TOML file path
    pub fn load_from(path: &str) -> Result<Self> {
        Self::figment()
            .merge(Toml::file(path))
            .merge(Env::prefixed("DOCSMITH_").split("__"))
            .extract()
            .map_err(Into::into)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }
}
