//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use rolekit_core::UserId;
use rolekit_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_ADDR is not a socket address: {0}")]
    BindAddr(String),

    #[error("LOG_FORMAT: {0}")]
    LogFormat(#[from] rolekit_observability::UnknownLogFormat),

    #[error("RBAC_BOOTSTRAP_ADMIN: {0}")]
    BootstrapAdmin(String),

    #[error("{0} must not be empty when set")]
    Empty(&'static str),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// When set, roles and users live in Postgres; otherwise in memory.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    pub bootstrap_admin: Option<UserId>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            database_url: None,
            log_format: LogFormat::default(),
            bootstrap_admin: None,
        }
    }
}

impl ApiConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::BindAddr(bind_raw.clone()))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if secret.is_empty() => return Err(ConfigError::Empty("JWT_SECRET")),
            Some(secret) => secret,
            None => DEV_JWT_SECRET.to_string(),
        };

        let database_url = match lookup("DATABASE_URL") {
            Some(url) if url.trim().is_empty() => return Err(ConfigError::Empty("DATABASE_URL")),
            other => other,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let bootstrap_admin = lookup("RBAC_BOOTSTRAP_ADMIN")
            .map(UserId::parse)
            .transpose()
            .map_err(|e| ConfigError::BootstrapAdmin(e.to_string()))?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url,
            log_format,
            bootstrap_admin,
        })
    }
}
