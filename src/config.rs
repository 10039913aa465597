use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://masterplan.db?mode=rwc";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_AVATAR_BUCKET: &str = "avatars";
const DEFAULT_AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Which hosted client implementation backs the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendMode {
    Hosted,
    /// In-process store for local development. Nothing survives a restart.
    Memory,
}

#[derive(Clone, Debug)]
pub struct HostedConfig {
    pub base_url: String,
    pub anon_key: String,
}

impl HostedConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("HOSTED_URL")
            .map_err(|_| AppError::Config("HOSTED_URL is not set".to_string()))?;
        let anon_key = env::var("HOSTED_ANON_KEY")
            .map_err(|_| AppError::Config("HOSTED_ANON_KEY is not set".to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub backend: BackendMode,
    pub avatar_bucket: String,
    pub avatar_max_bytes: usize,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let addr = env::var("MASTERPLAN_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("MASTERPLAN_ADDR is invalid: {}", e)))?;

        let backend = match env::var("MASTERPLAN_BACKEND").as_deref() {
            Err(_) | Ok("hosted") => BackendMode::Hosted,
            Ok("memory") => BackendMode::Memory,
            Ok(other) => {
                return Err(AppError::Config(format!(
                    "MASTERPLAN_BACKEND must be 'hosted' or 'memory', got '{}'",
                    other
                )));
            }
        };

        let avatar_bucket =
            env::var("AVATAR_BUCKET").unwrap_or_else(|_| DEFAULT_AVATAR_BUCKET.to_string());

        let avatar_max_bytes = match env::var("AVATAR_MAX_BYTES") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| AppError::Config(format!("AVATAR_MAX_BYTES is invalid: {}", e)))?,
            Err(_) => DEFAULT_AVATAR_MAX_BYTES,
        };

        Ok(Self {
            database_url,
            addr,
            backend,
            avatar_bucket,
            avatar_max_bytes,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend: BackendMode::Hosted,
            avatar_bucket: DEFAULT_AVATAR_BUCKET.to_string(),
            avatar_max_bytes: DEFAULT_AVATAR_MAX_BYTES,
        }
    }
}
